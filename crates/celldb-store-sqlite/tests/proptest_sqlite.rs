// crates/celldb-store-sqlite/tests/proptest_sqlite.rs
// ============================================================================
// Module: SQLite Property-Based Tests
// Description: Value round-trips through SQLite column affinity.
// Purpose: Detect precision loss between conformed writes and reads.
// ============================================================================

//! Property-based tests for decimal storage in `SQLite`, from the default
//! column type up to the widest accepted precision.

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

use bigdecimal::BigDecimal;
use celldb_core::CellDb;
use celldb_core::DecimalType;
use celldb_core::ExpressionValue;
use celldb_core::FeatureId;
use celldb_core::MAX_DECIMAL_PRECISION;
use celldb_core::SampleId;
use celldb_core::SchemaConfig;
use celldb_store_sqlite::SqliteExecutor;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn default_decimal_values_round_trip(unscaled in -9_999_999_999_i64 .. 9_999_999_999_i64) {
        let db = CellDb::new(SqliteExecutor::in_memory().unwrap(), SchemaConfig::default());
        db.initialize();
        let feature = vec![FeatureId::new("f").unwrap()];
        let sample = SampleId::new("s").unwrap();
        let value = ExpressionValue::new(BigDecimal::new(unscaled.into(), 6));

        db.upsert_sample(&sample, &feature, std::slice::from_ref(&value), true).unwrap();
        let rows = db.matrix(std::slice::from_ref(&sample), &feature).unwrap();

        prop_assert_eq!(&rows[0].values, &vec![Some(value)]);
    }

    #[test]
    fn widest_decimal_values_round_trip(
        unscaled in -(10_i128.pow(38) - 1) ..= 10_i128.pow(38) - 1,
        scale in 0_u8 ..= MAX_DECIMAL_PRECISION,
    ) {
        let column_type = DecimalType::new(MAX_DECIMAL_PRECISION, scale).unwrap();
        let db = CellDb::new(SqliteExecutor::in_memory().unwrap(), SchemaConfig { column_type });
        db.initialize();
        let feature = vec![FeatureId::new("f").unwrap()];
        let sample = SampleId::new("s").unwrap();
        let value = ExpressionValue::new(BigDecimal::new(unscaled.into(), i64::from(scale)));

        db.upsert_sample(&sample, &feature, std::slice::from_ref(&value), true).unwrap();
        let rows = db.matrix(std::slice::from_ref(&sample), &feature).unwrap();

        prop_assert_eq!(&rows[0].values, &vec![Some(value)]);
    }
}
