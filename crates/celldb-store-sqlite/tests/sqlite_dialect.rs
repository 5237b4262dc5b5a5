// crates/celldb-store-sqlite/tests/sqlite_dialect.rs
// ============================================================================
// Module: SQLite Dialect Tests
// Description: Statement shapes rendered for SQLite.
// ============================================================================
//! ## Overview
//! Pins quoting, per-column alters, and upsert clauses.

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

use celldb_core::DecimalType;
use celldb_core::Dialect;
use celldb_core::FeatureId;
use celldb_core::PageRequest;
use celldb_core::SampleId;
use celldb_core::SqlValue;
use celldb_core::Statement;
use celldb_core::build_projection;
use celldb_core::sql::FeatureCell;
use celldb_store_sqlite::MAX_BOUND_PARAMS;
use celldb_store_sqlite::SqliteDialect;
use celldb_store_sqlite::quote_identifier;

fn ids(raw: &[&str]) -> Vec<FeatureId> {
    FeatureId::parse_all(raw).unwrap()
}

fn sql(statement: &Statement) -> Vec<String> {
    SqliteDialect.render(statement).into_iter().map(|rendered| rendered.sql).collect()
}

#[test]
fn identifiers_are_quoted_and_escaped() {
    assert_eq!(quote_identifier("f1"), "\"f1\"");
    assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
}

#[test]
fn column_additions_render_one_text_alter_per_feature() {
    let rendered = sql(&Statement::AddFeatureColumns {
        feature_ids: ids(&["f1", "f2"]),
        column_type: DecimalType::new(38, 10).unwrap(),
    });
    assert_eq!(
        rendered,
        vec![
            "ALTER TABLE \"Expressions\" ADD COLUMN \"f1\" TEXT".to_string(),
            "ALTER TABLE \"Expressions\" ADD COLUMN \"f2\" TEXT".to_string(),
        ]
    );
}

#[test]
fn sample_upsert_updates_only_named_columns() {
    let rendered = sql(&Statement::UpsertSampleRow {
        sample_id: SampleId::new("s").unwrap(),
        cells: vec![FeatureCell {
            feature_id: ids(&["f1"]).remove(0),
            value: "1".parse().unwrap(),
        }],
    });
    assert_eq!(
        rendered,
        vec![
            "INSERT INTO \"Expressions\" (\"sampleId\", \"f1\") VALUES (?, ?) ON CONFLICT \
             (\"sampleId\") DO UPDATE SET \"f1\" = excluded.\"f1\""
                .to_string()
        ]
    );
}

#[test]
fn catalog_upsert_without_name_does_nothing_on_conflict() {
    let rendered = sql(&Statement::UpsertCatalogEntry {
        feature_id: ids(&["f1"]).remove(0),
        feature_name: None,
    });
    assert!(rendered[0].ends_with("ON CONFLICT (\"featureId\") DO NOTHING"));
}

#[test]
fn listings_order_by_rowid_and_clamp_bounds() {
    assert_eq!(
        sql(&Statement::ListSampleIds(PageRequest::new(u64::MAX, 5))),
        vec![format!(
            "SELECT \"sampleId\" FROM \"Expressions\" ORDER BY rowid LIMIT {} OFFSET 5",
            i64::MAX
        )]
    );
}

#[test]
fn empty_projection_filter_matches_nothing() {
    assert_eq!(
        sql(&build_projection(&[], &ids(&["f1"]))),
        vec!["SELECT \"sampleId\", \"f1\" FROM \"Expressions\" WHERE 1 = 0".to_string()]
    );
}

#[test]
fn long_sample_filters_are_split_into_bounded_statements() {
    let samples: Vec<SampleId> = (0 .. MAX_BOUND_PARAMS + 2)
        .map(|index| SampleId::new(format!("s{index}")).unwrap())
        .collect();

    let rendered = SqliteDialect.render(&build_projection(&samples, &ids(&["f1"])));

    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].params.len(), MAX_BOUND_PARAMS);
    assert_eq!(rendered[1].params.len(), 2);
    assert!(
        rendered
            .iter()
            .all(|part| part.sql.starts_with("SELECT \"sampleId\", \"f1\" FROM \"Expressions\""))
    );
}

#[test]
fn catalog_membership_ignores_case() {
    let rendered = SqliteDialect.render(&Statement::SelectKnownFeatures {
        feature_ids: ids(&["Gene"]),
    });
    assert_eq!(
        rendered[0].sql,
        "SELECT \"featureId\" FROM \"Features\" WHERE upper(\"featureId\") IN (?)"
    );
    assert_eq!(rendered[0].params, vec![SqlValue::Text("GENE".to_string())]);
}
