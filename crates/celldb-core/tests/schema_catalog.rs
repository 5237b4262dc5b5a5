// crates/celldb-core/tests/schema_catalog.rs
// ============================================================================
// Module: Schema Catalog Tests
// Description: Feature registration, listing, and known-feature lookups.
// ============================================================================
//! ## Overview
//! Exercises catalog writes and reads against the in-memory executor.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use celldb_core::CellDbError;
use celldb_core::FeatureId;
use celldb_core::FeatureRecord;
use celldb_core::InMemoryExecutor;
use celldb_core::MemoryAuditSink;
use celldb_core::PageRequest;
use celldb_core::SchemaCatalog;
use celldb_core::Statement;
use celldb_core::initialize;

fn ids(raw: &[&str]) -> Vec<FeatureId> {
    FeatureId::parse_all(raw).unwrap()
}

fn ready_executor() -> InMemoryExecutor {
    let executor = InMemoryExecutor::new();
    assert!(initialize(&executor, &MemoryAuditSink::new()).is_clean());
    executor.clear_statements();
    executor
}

#[test]
fn register_feature_is_idempotent_and_keeps_existing_name() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);
    let gene = FeatureId::new("expr_gene1").unwrap();

    catalog.register_feature(&gene, Some("Gene One")).unwrap();
    catalog.register_feature(&gene, None).unwrap();

    let records = catalog.list_feature_records(PageRequest::features_default()).unwrap();
    assert_eq!(
        records,
        vec![FeatureRecord {
            feature_id: gene,
            feature_name: Some("Gene One".to_string()),
        }]
    );
    assert_eq!(audit.events().len(), 2);
    assert!(audit.events().iter().all(|event| event.event == "features_registered"));
}

#[test]
fn register_feature_updates_name_when_given() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);
    let gene = FeatureId::new("expr_gene1").unwrap();

    catalog.register_feature(&gene, Some("old")).unwrap();
    catalog.register_feature(&gene, Some("new")).unwrap();

    let records = catalog.list_feature_records(PageRequest::features_default()).unwrap();
    assert_eq!(records[0].feature_name.as_deref(), Some("new"));
}

#[test]
fn register_features_rejects_name_arity_before_writing() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);

    let err = catalog.register_features(&ids(&["f1", "f2"]), Some(&["only one name"][..])).unwrap_err();

    assert_eq!(
        err,
        CellDbError::ArityMismatch {
            context: "feature names",
            expected: 2,
            actual: 1,
        }
    );
    assert!(executor.statements().is_empty());
    assert!(audit.events().is_empty());
}

#[test]
fn list_features_pages_in_storage_order() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);
    catalog.register_features(&ids(&["c", "a", "b"]), None::<&[&str]>).unwrap();

    assert_eq!(catalog.list_features(PageRequest::features_default()).unwrap(), ids(&["c", "a", "b"]));
    assert_eq!(catalog.list_features(PageRequest::new(1, 1)).unwrap(), ids(&["a"]));
    assert!(catalog.list_features(PageRequest::new(10, 3)).unwrap().is_empty());
}

#[test]
fn known_features_returns_catalog_subset() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);
    catalog.register_features(&ids(&["f1", "f2"]), None::<&[&str]>).unwrap();

    let known = catalog.known_features(&ids(&["f2", "f3"])).unwrap();
    assert_eq!(known.len(), 1);
    assert!(known.contains(&FeatureId::new("f2").unwrap()));
}

#[test]
fn known_features_ignores_case_variants() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);
    catalog.register_feature(&FeatureId::new("Gene").unwrap(), None).unwrap();

    assert!(catalog.known_features(&ids(&["GENE"])).unwrap().is_empty());
    let known = catalog.known_features(&ids(&["Gene"])).unwrap();
    assert!(known.contains(&FeatureId::new("Gene").unwrap()));
}

#[test]
fn known_features_issues_no_statement_for_empty_input() {
    let executor = ready_executor();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);

    assert!(catalog.known_features(&[]).unwrap().is_empty());
    assert!(executor.statements().is_empty());
}

#[test]
fn catalog_reads_fail_before_initialization() {
    let executor = InMemoryExecutor::new();
    let audit = MemoryAuditSink::new();
    let catalog = SchemaCatalog::new(&executor, &audit);

    let err = catalog.list_features(PageRequest::features_default()).unwrap_err();
    assert!(matches!(err, CellDbError::Backend(_)));
    assert!(matches!(executor.statements().as_slice(), [Statement::ListFeatureIds(_)]));
}
