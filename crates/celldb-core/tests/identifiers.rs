// crates/celldb-core/tests/identifiers.rs
// ============================================================================
// Module: Identifier Tests
// Description: Feature and sample identifier validation.
// ============================================================================
//! ## Overview
//! Feature ids become column names, so their grammar is strict; sample ids are
//! bound values and only need to be printable and bounded.

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
use celldb_core::IdentifierError;
use celldb_core::InMemoryExecutor;
use celldb_core::MAX_FEATURE_ID_LENGTH;
use celldb_core::MAX_SAMPLE_ID_LENGTH;
use celldb_core::SampleId;
use celldb_core::SchemaConfig;

#[test]
fn feature_ids_follow_column_name_grammar() {
    assert!(FeatureId::new("expr_gene1").is_ok());
    assert!(FeatureId::new("_hidden").is_ok());
    assert!(FeatureId::new("x".repeat(MAX_FEATURE_ID_LENGTH)).is_ok());

    for bad in ["", "1abc", "has space", "semi;colon", "quote\"d", "ümlaut"] {
        assert!(
            matches!(FeatureId::new(bad), Err(IdentifierError::Feature { .. })),
            "accepted {bad}"
        );
    }
    assert!(FeatureId::new("x".repeat(MAX_FEATURE_ID_LENGTH + 1)).is_err());
}

#[test]
fn feature_ids_reject_keywords_and_the_key_column() {
    assert!(FeatureId::new("select").is_err());
    assert!(FeatureId::new("Upsert").is_err());
    assert!(FeatureId::new("SAMPLEID").is_err());
    assert!(FeatureId::new("sampleId2").is_ok());
}

#[test]
fn sample_ids_are_bounded_and_printable() {
    assert!(SampleId::new("TCGA-02-0001-01C; DROP TABLE x").is_ok());
    assert!(SampleId::new("").is_err());
    assert!(SampleId::new("tab\there").is_err());
    assert!(SampleId::new("x".repeat(MAX_SAMPLE_ID_LENGTH)).is_ok());
    assert!(SampleId::new("x".repeat(MAX_SAMPLE_ID_LENGTH + 1)).is_err());
}

#[test]
fn feature_ids_round_trip_through_serde_with_validation() {
    let id: FeatureId = serde_json::from_str("\"gene\"").unwrap();
    assert_eq!(id.as_str(), "gene");
    assert!(serde_json::from_str::<FeatureId>("\"bad id\"").is_err());
}

#[test]
fn duplicate_features_differing_only_in_case_are_rejected() {
    let db = CellDb::new(InMemoryExecutor::new(), SchemaConfig::default());
    db.initialize();
    let features = FeatureId::parse_all(&["Gene", "gene"]).unwrap();

    let err = db
        .upsert_sample(
            &SampleId::new("s").unwrap(),
            &features,
            &[ExpressionValue::from(1), ExpressionValue::from(2)],
            true,
        )
        .unwrap_err();

    assert_eq!(err, CellDbError::DuplicateFeature("gene".to_string()));
}
