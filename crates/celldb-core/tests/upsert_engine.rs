// crates/celldb-core/tests/upsert_engine.rs
// ============================================================================
// Module: Upsert Engine Tests
// Description: Sample and feature upserts, validation, and partial batches.
// ============================================================================
//! ## Overview
//! Checks that every write path validates before I/O, evolves and registers
//! features, and writes column-level upserts.

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

use celldb_core::CellDb;
use celldb_core::CellDbError;
use celldb_core::ExecutionError;
use celldb_core::ExpressionValue;
use celldb_core::FeatureId;
use celldb_core::InMemoryExecutor;
use celldb_core::PageRequest;
use celldb_core::ResultRow;
use celldb_core::SampleId;
use celldb_core::SchemaConfig;
use celldb_core::Statement;
use celldb_core::StatementExecutor;
use celldb_core::ValueError;

fn ids(raw: &[&str]) -> Vec<FeatureId> {
    FeatureId::parse_all(raw).unwrap()
}

fn sample(raw: &str) -> SampleId {
    SampleId::new(raw).unwrap()
}

fn values(raw: &[&str]) -> Vec<ExpressionValue> {
    raw.iter().map(|value| value.parse().unwrap()).collect()
}

fn ready_db() -> CellDb<InMemoryExecutor> {
    let db = CellDb::new(InMemoryExecutor::new(), SchemaConfig::default());
    db.initialize();
    db.executor().clear_statements();
    db
}

#[test]
fn upsert_sample_evolves_registers_and_writes() {
    let db = ready_db();

    let report = db.upsert_sample(&sample("s1"), &ids(&["f1", "f2"]), &values(&["1.5", "2"]), true).unwrap();

    assert_eq!(report.rows_written, 1);
    assert_eq!(report.evolution.unwrap().added, ids(&["f1", "f2"]));
    assert_eq!(db.list_features(PageRequest::features_default()).unwrap(), ids(&["f1", "f2"]));
    let rows = db.matrix(&[sample("s1")], &ids(&["f1", "f2"])).unwrap();
    assert_eq!(rows[0].values, vec![Some(values(&["1.5"])[0].clone()), Some(values(&["2"])[0].clone())]);
}

#[test]
fn upsert_sample_without_evolution_fails_on_missing_column() {
    let db = ready_db();

    let err = db.upsert_sample(&sample("s1"), &ids(&["f1"]), &values(&["1"]), false).unwrap_err();

    assert!(matches!(err, CellDbError::UnknownColumn(_)));
    assert!(matches!(db.executor().statements().as_slice(), [Statement::UpsertSampleRow { .. }]));
}

#[test]
fn upsert_sample_rejects_arity_mismatch_before_io() {
    let db = ready_db();

    let err = db.upsert_sample(&sample("s1"), &ids(&["f1", "f2"]), &values(&["1"]), true).unwrap_err();

    assert_eq!(
        err,
        CellDbError::ArityMismatch {
            context: "feature values",
            expected: 2,
            actual: 1,
        }
    );
    assert!(db.executor().statements().is_empty());
}

#[test]
fn upsert_sample_rejects_out_of_range_value_before_io() {
    let db = ready_db();

    let err = db.upsert_sample(&sample("s1"), &ids(&["f1"]), &values(&["123456.5"]), true).unwrap_err();

    assert!(matches!(err, CellDbError::InvalidValue(ValueError::OutOfRange { .. })));
    assert!(db.executor().statements().is_empty());
}

#[test]
fn upsert_sample_rejects_huge_exponents_before_io() {
    let db = ready_db();

    let err = db.upsert_sample(&sample("s1"), &ids(&["f1"]), &values(&["1e100000000"]), true).unwrap_err();

    assert!(matches!(err, CellDbError::InvalidValue(ValueError::OutOfRange { .. })));
    assert!(db.executor().statements().is_empty());
}

#[test]
fn upsert_sample_rejects_case_variant_of_cataloged_feature() {
    let db = ready_db();
    db.upsert_feature(&ids(&["gene"])[0], None).unwrap();

    let err = db.upsert_sample(&sample("s1"), &ids(&["GENE"]), &values(&["1"]), true).unwrap_err();

    assert!(matches!(err, CellDbError::DuplicateFeature(_)));
    assert_eq!(db.list_features(PageRequest::features_default()).unwrap(), ids(&["gene"]));
}

#[test]
fn upsert_sample_rejects_duplicate_features_before_io() {
    let db = ready_db();

    let err = db.upsert_sample(&sample("s1"), &ids(&["f1", "f1"]), &values(&["1", "2"]), true).unwrap_err();

    assert_eq!(err, CellDbError::DuplicateFeature("f1".to_string()));
    assert!(db.executor().statements().is_empty());
}

#[test]
fn upsert_sample_rounds_to_column_scale() {
    let db = ready_db();

    db.upsert_sample(&sample("s1"), &ids(&["f1"]), &values(&["0.12345675"]), true).unwrap();

    let rows = db.matrix(&[sample("s1")], &ids(&["f1"])).unwrap();
    assert_eq!(rows[0].values[0].as_ref().unwrap().to_plain_string(), "0.123457");
}

#[test]
fn column_level_upsert_preserves_unnamed_columns() {
    let db = ready_db();

    db.upsert_sample(&sample("S"), &ids(&["A"]), &values(&["1"]), true).unwrap();
    db.upsert_sample(&sample("S"), &ids(&["B"]), &values(&["2"]), true).unwrap();

    let rows = db.matrix(&[sample("S")], &ids(&["A", "B"])).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values, vec![Some(ExpressionValue::from(1)), Some(ExpressionValue::from(2))]);
}

#[test]
fn upsert_samples_evolves_once_and_writes_in_order() {
    let db = ready_db();
    let features = ids(&["f1", "f2"]);

    let report = db
        .upsert_samples(&[sample("a"), sample("b")], &features, &[values(&["1", "2"]), values(&["3", "4"])])
        .unwrap();

    assert_eq!(report.rows_written, 2);
    let alterations = db
        .executor()
        .statements()
        .into_iter()
        .filter(|statement| matches!(statement, Statement::AddFeatureColumns { .. }))
        .count();
    assert_eq!(alterations, 1);
    assert_eq!(db.list_samples(PageRequest::samples_default()).unwrap(), vec![sample("a"), sample("b")]);
}

#[test]
fn upsert_samples_rejects_short_vector_before_io() {
    let db = ready_db();

    let err = db
        .upsert_samples(&[sample("a"), sample("b")], &ids(&["f1", "f2"]), &[values(&["1", "2"]), values(&["3"])])
        .unwrap_err();

    assert!(matches!(err, CellDbError::ArityMismatch { expected: 2, actual: 1, .. }));
    assert!(db.executor().statements().is_empty());
}

#[test]
fn upsert_samples_rejects_vector_count_mismatch_before_io() {
    let db = ready_db();

    let err = db.upsert_samples(&[sample("a"), sample("b")], &ids(&["f1"]), &[values(&["1"])]).unwrap_err();

    assert_eq!(
        err,
        CellDbError::ArityMismatch {
            context: "sample vectors",
            expected: 2,
            actual: 1,
        }
    );
    assert!(db.executor().statements().is_empty());
}

/// Executor that fails the n-th row write.
struct FailingRowWrites {
    /// Backing executor.
    inner: InMemoryExecutor,
    /// One-based index of the row write that fails.
    fail_on: usize,
    /// Row writes seen so far.
    seen: std::sync::Mutex<usize>,
}

impl StatementExecutor for FailingRowWrites {
    fn execute(&self, statement: &Statement) -> Result<(), ExecutionError> {
        if matches!(statement, Statement::UpsertSampleRow { .. }) {
            let mut seen = self.seen.lock().unwrap();
            *seen += 1;
            if *seen == self.fail_on {
                return Err(ExecutionError::Backend("disk full".to_string()));
            }
        }
        self.inner.execute(statement)
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        self.inner.fetch_all(statement)
    }
}

#[test]
fn upsert_samples_keeps_rows_written_before_a_failure() {
    let inner = InMemoryExecutor::new();
    let db = CellDb::new(
        FailingRowWrites {
            inner: inner.clone(),
            fail_on: 2,
            seen: std::sync::Mutex::new(0),
        },
        SchemaConfig::default(),
    );
    db.initialize();

    let err = db
        .upsert_samples(
            &[sample("a"), sample("b"), sample("c")],
            &ids(&["f1"]),
            &[values(&["1"]), values(&["2"]), values(&["3"])],
        )
        .unwrap_err();

    assert_eq!(err, CellDbError::Backend("disk full".to_string()));
    let reader = CellDb::new(inner, SchemaConfig::default());
    assert_eq!(reader.list_samples(PageRequest::samples_default()).unwrap(), vec![sample("a")]);
}

#[test]
fn upsert_features_rejects_name_arity_without_touching_schema() {
    let db = ready_db();

    let err = db.upsert_features(&ids(&["f1", "f2"]), Some(&["only one name"][..])).unwrap_err();

    assert!(matches!(err, CellDbError::ArityMismatch { .. }));
    assert!(db.executor().statements().is_empty());
    assert!(db.list_features(PageRequest::features_default()).unwrap().is_empty());
}

#[test]
fn upsert_features_registers_names_and_columns() {
    let db = ready_db();

    let outcome = db.upsert_features(&ids(&["f1", "f2"]), Some(&["one", "two"][..])).unwrap();

    assert_eq!(outcome.added, ids(&["f1", "f2"]));
    let records = db.list_feature_records(PageRequest::features_default()).unwrap();
    assert_eq!(records[1].feature_name.as_deref(), Some("two"));
    db.upsert_sample(&sample("s"), &ids(&["f2"]), &values(&["1"]), false).unwrap();
}

#[test]
fn upsert_feature_is_repeatable() {
    let db = ready_db();
    let gene = FeatureId::new("gene").unwrap();

    db.upsert_feature(&gene, Some("Gene")).unwrap();
    let outcome = db.upsert_feature(&gene, None).unwrap();

    assert_eq!(outcome.already_present, vec![gene.clone()]);
    let records = db.list_feature_records(PageRequest::features_default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].feature_name.as_deref(), Some("Gene"));
}

#[test]
fn upsert_sample_repairs_columns_for_catalog_only_features() {
    let db = ready_db();
    db.register_features(&ids(&["f1"]), Some(&["Feature One"][..])).unwrap();

    let report = db.upsert_sample(&sample("s1"), &ids(&["f1"]), &values(&["4"]), true).unwrap();

    assert_eq!(report.evolution.unwrap().added, ids(&["f1"]));
    let rows = db.matrix(&[sample("s1")], &ids(&["f1"])).unwrap();
    assert_eq!(rows[0].values, vec![Some(ExpressionValue::from(4))]);
}
