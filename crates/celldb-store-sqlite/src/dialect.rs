// crates/celldb-store-sqlite/src/dialect.rs
// ============================================================================
// Module: SQLite Dialect
// Description: Renders CellDB statements as SQLite SQL.
// Purpose: Quote identifiers and express upserts in SQLite's syntax.
// Dependencies: celldb-core
// ============================================================================

//! ## Overview
//! Differences from the Phoenix shapes:
//! - identifiers are double-quoted;
//! - feature columns are declared `TEXT`, so conformed decimals are stored as
//!   their exact plain rendering at any precision the column type allows
//!   (`NUMERIC` affinity would coerce them to 64-bit floats);
//! - `ALTER TABLE` adds one column per statement, so a multi-column addition
//!   renders as several statements the executor runs in one transaction;
//! - upserts are `INSERT ... ON CONFLICT ... DO UPDATE` touching only the
//!   named columns;
//! - listings order by `rowid` so pages follow insertion order;
//! - sample and catalog `IN` filters longer than [`MAX_BOUND_PARAMS`] are
//!   split into several statements whose rows the executor concatenates.
//!
//! `SQLite` caps a table at 2000 columns by default, so a row store holds at
//! most 1999 feature columns; adding more fails with a backend error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use celldb_core::FeatureId;
use celldb_core::PageRequest;
use celldb_core::sql::CATALOG_TABLE;
use celldb_core::sql::Dialect;
use celldb_core::sql::FEATURE_KEY_COLUMN;
use celldb_core::sql::FEATURE_NAME_COLUMN;
use celldb_core::sql::Projection;
use celldb_core::sql::ROW_STORE_TABLE;
use celldb_core::sql::Relation;
use celldb_core::sql::RenderedStatement;
use celldb_core::sql::SAMPLE_KEY_COLUMN;
use celldb_core::sql::SqlValue;
use celldb_core::sql::Statement;
use celldb_core::sql::placeholders;
use celldb_core::sql::render_projection;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest LIMIT/OFFSET literal `SQLite` accepts (signed 64-bit).
const SQLITE_MAX_BOUND: u64 = i64::MAX.unsigned_abs();
/// Host parameters per statement (`SQLITE_MAX_VARIABLE_NUMBER`).
pub const MAX_BOUND_PARAMS: usize = 32_766;
/// Declared type of feature columns.
pub const FEATURE_COLUMN_TYPE: &str = "TEXT";

// ============================================================================
// SECTION: Dialect
// ============================================================================

/// `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn render(&self, statement: &Statement) -> Vec<RenderedStatement> {
        match statement {
            Statement::CreateRelation(Relation::RowStore) => vec![RenderedStatement::bare(format!(
                "CREATE TABLE {} ({} TEXT PRIMARY KEY NOT NULL)",
                quote_identifier(ROW_STORE_TABLE),
                quote_identifier(SAMPLE_KEY_COLUMN)
            ))],
            Statement::CreateRelation(Relation::Catalog) => vec![RenderedStatement::bare(format!(
                "CREATE TABLE {} ({} TEXT PRIMARY KEY NOT NULL, {} TEXT)",
                quote_identifier(CATALOG_TABLE),
                quote_identifier(FEATURE_KEY_COLUMN),
                quote_identifier(FEATURE_NAME_COLUMN)
            ))],
            Statement::AddFeatureColumns {
                feature_ids,
                column_type: _,
            } => {
                let table = quote_identifier(ROW_STORE_TABLE);
                feature_ids
                    .iter()
                    .map(|id| {
                        RenderedStatement::bare(format!(
                            "ALTER TABLE {table} ADD COLUMN {} {FEATURE_COLUMN_TYPE}",
                            quote_identifier(id.as_str())
                        ))
                    })
                    .collect()
            }
            Statement::UpsertCatalogEntry {
                feature_id,
                feature_name,
            } => vec![render_catalog_upsert(feature_id, feature_name.as_deref())],
            Statement::UpsertSampleRow {
                sample_id,
                cells,
            } => {
                let key = quote_identifier(SAMPLE_KEY_COLUMN);
                let mut columns = vec![key.clone()];
                columns.extend(cells.iter().map(|cell| quote_identifier(cell.feature_id.as_str())));
                let mut params = vec![SqlValue::Text(sample_id.to_string())];
                params.extend(cells.iter().map(|cell| SqlValue::from(&cell.value)));
                let action = if cells.is_empty() {
                    "DO NOTHING".to_string()
                } else {
                    let assignments = columns
                        .iter()
                        .skip(1)
                        .map(|column| format!("{column} = excluded.{column}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("DO UPDATE SET {assignments}")
                };
                vec![RenderedStatement::with_params(
                    format!(
                        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({key}) {action}",
                        quote_identifier(ROW_STORE_TABLE),
                        columns.join(", "),
                        placeholders(params.len())
                    ),
                    params,
                )]
            }
            Statement::SelectKnownFeatures {
                feature_ids,
            } => feature_ids.chunks(MAX_BOUND_PARAMS).map(render_known_features).collect(),
            Statement::ListFeatureIds(page) => {
                vec![render_listing(&[FEATURE_KEY_COLUMN], CATALOG_TABLE, *page)]
            }
            Statement::ListFeatureRecords(page) => vec![render_listing(
                &[FEATURE_KEY_COLUMN, FEATURE_NAME_COLUMN],
                CATALOG_TABLE,
                *page,
            )],
            Statement::ListSampleIds(page) => {
                vec![render_listing(&[SAMPLE_KEY_COLUMN], ROW_STORE_TABLE, *page)]
            }
            Statement::Project(projection) => {
                if projection.sample_ids().len() <= MAX_BOUND_PARAMS {
                    return vec![render_projection(projection, quote_identifier)];
                }
                projection
                    .sample_ids()
                    .chunks(MAX_BOUND_PARAMS)
                    .map(|chunk| {
                        let part = Projection::new(chunk, projection.feature_ids());
                        render_projection(&part, quote_identifier)
                    })
                    .collect()
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Quotes an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a catalog insert-or-update. Without a name an existing entry is
/// left as is.
fn render_catalog_upsert(feature_id: &FeatureId, feature_name: Option<&str>) -> RenderedStatement {
    let table = quote_identifier(CATALOG_TABLE);
    let key = quote_identifier(FEATURE_KEY_COLUMN);
    match feature_name {
        Some(name) => {
            let name_column = quote_identifier(FEATURE_NAME_COLUMN);
            RenderedStatement::with_params(
                format!(
                    "INSERT INTO {table} ({key}, {name_column}) VALUES (?, ?) ON CONFLICT ({key}) \
                     DO UPDATE SET {name_column} = excluded.{name_column}"
                ),
                vec![SqlValue::Text(feature_id.to_string()), SqlValue::Text(name.to_string())],
            )
        }
        None => RenderedStatement::with_params(
            format!("INSERT INTO {table} ({key}) VALUES (?) ON CONFLICT ({key}) DO NOTHING"),
            vec![SqlValue::Text(feature_id.to_string())],
        ),
    }
}

/// Renders one case-insensitive catalog membership query.
fn render_known_features(feature_ids: &[FeatureId]) -> RenderedStatement {
    RenderedStatement::with_params(
        format!(
            "SELECT {key} FROM {} WHERE upper({key}) IN ({})",
            quote_identifier(CATALOG_TABLE),
            placeholders(feature_ids.len()),
            key = quote_identifier(FEATURE_KEY_COLUMN)
        ),
        feature_ids.iter().map(|id| SqlValue::Text(id.as_str().to_ascii_uppercase())).collect(),
    )
}

/// Renders a paginated listing in insertion order.
fn render_listing(columns: &[&str], table: &str, page: PageRequest) -> RenderedStatement {
    let columns = columns.iter().map(|column| quote_identifier(column)).collect::<Vec<_>>().join(", ");
    RenderedStatement::bare(format!(
        "SELECT {columns} FROM {} ORDER BY rowid LIMIT {} OFFSET {}",
        quote_identifier(table),
        page.limit.min(SQLITE_MAX_BOUND),
        page.offset.min(SQLITE_MAX_BOUND)
    ))
}
