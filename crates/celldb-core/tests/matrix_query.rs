// crates/celldb-core/tests/matrix_query.rs
// ============================================================================
// Module: Matrix Query Tests
// Description: Projection building and sub-matrix reconstruction.
// ============================================================================
//! ## Overview
//! Covers projection edge cases, request-order rows, sparse cells, and the
//! end-to-end register/upsert/read flow.

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
use celldb_core::ExpressionValue;
use celldb_core::FeatureId;
use celldb_core::InMemoryExecutor;
use celldb_core::MatrixRow;
use celldb_core::PageRequest;
use celldb_core::SampleId;
use celldb_core::SchemaConfig;
use celldb_core::Statement;
use celldb_core::build_projection;

fn ids(raw: &[&str]) -> Vec<FeatureId> {
    FeatureId::parse_all(raw).unwrap()
}

fn samples(raw: &[&str]) -> Vec<SampleId> {
    SampleId::parse_all(raw).unwrap()
}

fn value(raw: &str) -> ExpressionValue {
    raw.parse().unwrap()
}

fn ready_db() -> CellDb<InMemoryExecutor> {
    let db = CellDb::new(InMemoryExecutor::new(), SchemaConfig::default());
    db.initialize();
    db
}

#[test]
fn projection_with_no_samples_returns_no_rows() {
    let db = ready_db();
    db.upsert_sample(&samples(&["s1"])[0], &ids(&["f1"]), &[value("1")], true).unwrap();

    let Statement::Project(projection) = build_projection(&[], &ids(&["f1"])) else {
        panic!("expected projection");
    };
    assert!(projection.sample_ids().is_empty());
    assert!(db.matrix(&[], &ids(&["f1"])).unwrap().is_empty());
}

#[test]
fn projection_with_no_features_is_key_only() {
    let db = ready_db();
    db.upsert_sample(&samples(&["s1"])[0], &ids(&["f1"]), &[value("1")], true).unwrap();

    let Statement::Project(projection) = build_projection(&samples(&["s1"]), &[]) else {
        panic!("expected projection");
    };
    assert_eq!(projection.column_labels(), vec!["sampleId"]);
    assert_eq!(
        db.matrix(&samples(&["s1"]), &[]).unwrap(),
        vec![MatrixRow {
            sample_id: samples(&["s1"])[0].clone(),
            values: Vec::new(),
        }]
    );
}

#[test]
fn projection_keeps_feature_order_and_collapses_duplicate_samples() {
    let Statement::Project(projection) =
        build_projection(&samples(&["b", "a", "b"]), &ids(&["f2", "f1"]))
    else {
        panic!("expected projection");
    };
    assert_eq!(projection.sample_ids(), samples(&["b", "a"]).as_slice());
    assert_eq!(projection.column_labels(), vec!["sampleId", "f2", "f1"]);
}

#[test]
fn matrix_fails_on_unknown_feature() {
    let db = ready_db();
    db.upsert_sample(&samples(&["s1"])[0], &ids(&["f1"]), &[value("1")], true).unwrap();

    let err = db.matrix(&samples(&["s1"]), &ids(&["f1", "missing"])).unwrap_err();

    assert!(matches!(err, CellDbError::UnknownColumn(_)));
}

#[test]
fn matrix_returns_rows_in_request_order_with_sparse_cells() {
    let db = ready_db();
    db.upsert_sample(&samples(&["first"])[0], &ids(&["f1"]), &[value("1")], true).unwrap();
    db.upsert_sample(&samples(&["second"])[0], &ids(&["f2"]), &[value("2")], true).unwrap();

    let rows = db.matrix(&samples(&["second", "ghost", "first"]), &ids(&["f1", "f2"])).unwrap();

    assert_eq!(
        rows,
        vec![
            MatrixRow {
                sample_id: samples(&["second"])[0].clone(),
                values: vec![None, Some(value("2"))],
            },
            MatrixRow {
                sample_id: samples(&["first"])[0].clone(),
                values: vec![Some(value("1")), None],
            },
        ]
    );
}

#[test]
fn register_then_upsert_reconstructs_expected_matrix() {
    let db = ready_db();
    let genes = ids(&["expr_gene1", "expr_gene2"]);
    db.register_features(&genes, None::<&[&str]>).unwrap();

    db.upsert_sample(&samples(&["sampleA"])[0], &genes, &[value("3.5"), value("0")], true).unwrap();
    db.upsert_sample(&samples(&["sampleB"])[0], &genes, &[value("0"), value("7.25")], true).unwrap();

    let rows = db.matrix(&samples(&["sampleA", "sampleB"]), &genes).unwrap();
    assert_eq!(
        rows,
        vec![
            MatrixRow {
                sample_id: samples(&["sampleA"])[0].clone(),
                values: vec![Some(value("3.5")), Some(value("0"))],
            },
            MatrixRow {
                sample_id: samples(&["sampleB"])[0].clone(),
                values: vec![Some(value("0")), Some(value("7.25"))],
            },
        ]
    );
    let listed = db.list_features(PageRequest::features_default()).unwrap();
    assert_eq!(listed, genes);
}
