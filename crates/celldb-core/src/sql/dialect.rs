// crates/celldb-core/src/sql/dialect.rs
// ============================================================================
// Module: CellDB SQL Dialects
// Description: Rendering of structured statements into parameterized SQL.
// Purpose: Keep identifier quoting and value binding in one layer per backend.
// Dependencies: crate::sql::statement
// ============================================================================

//! ## Overview
//! A [`Dialect`] turns a [`Statement`] into one or more [`RenderedStatement`]s.
//! Values are always bound as parameters; only validated identifiers and
//! integer page bounds appear in SQL text.
//!
//! [`PhoenixDialect`] renders the statement shapes an Apache Phoenix
//! deployment expects (`UPSERT INTO`, multi-column `ALTER TABLE ... ADD`,
//! unquoted identifiers) with `?` placeholders in place of literals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::sql::statement::CATALOG_TABLE;
use crate::sql::statement::FEATURE_KEY_COLUMN;
use crate::sql::statement::FEATURE_NAME_COLUMN;
use crate::sql::statement::Projection;
use crate::sql::statement::Relation;
use crate::sql::statement::ROW_STORE_TABLE;
use crate::sql::statement::SAMPLE_KEY_COLUMN;
use crate::sql::statement::SqlValue;
use crate::sql::statement::Statement;

// ============================================================================
// SECTION: Rendered Output
// ============================================================================

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlValue>,
}

impl RenderedStatement {
    /// Creates a statement without parameters.
    #[must_use]
    pub fn bare(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a statement with parameters.
    #[must_use]
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

// ============================================================================
// SECTION: Dialect Trait
// ============================================================================

/// Renders statement intent for a specific backend.
///
/// # Invariants
/// - A multi-statement rendering must be executed as one unit (all or nothing).
/// - Rendering never fails: identifiers are validated when constructed.
pub trait Dialect {
    /// Short dialect label for diagnostics.
    fn name(&self) -> &'static str;

    /// Renders a statement into one or more SQL statements.
    fn render(&self, statement: &Statement) -> Vec<RenderedStatement>;
}

/// Returns `count` comma-separated `?` placeholders.
#[must_use]
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// ============================================================================
// SECTION: Phoenix Dialect
// ============================================================================

/// Apache Phoenix dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoenixDialect;

impl Dialect for PhoenixDialect {
    fn name(&self) -> &'static str {
        "phoenix"
    }

    fn render(&self, statement: &Statement) -> Vec<RenderedStatement> {
        let rendered = match statement {
            Statement::CreateRelation(Relation::RowStore) => RenderedStatement::bare(format!(
                "CREATE TABLE {ROW_STORE_TABLE} ({SAMPLE_KEY_COLUMN} VARCHAR PRIMARY KEY)"
            )),
            Statement::CreateRelation(Relation::Catalog) => RenderedStatement::bare(format!(
                "CREATE TABLE {CATALOG_TABLE} ({FEATURE_KEY_COLUMN} VARCHAR PRIMARY KEY, \
                 {FEATURE_NAME_COLUMN} VARCHAR)"
            )),
            Statement::AddFeatureColumns {
                feature_ids,
                column_type,
            } => {
                let sql_type = column_type.sql_type();
                let columns = feature_ids
                    .iter()
                    .map(|id| format!("{id} {sql_type}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                RenderedStatement::bare(format!("ALTER TABLE {ROW_STORE_TABLE} ADD {columns}"))
            }
            Statement::UpsertCatalogEntry {
                feature_id,
                feature_name: Some(name),
            } => RenderedStatement::with_params(
                format!(
                    "UPSERT INTO {CATALOG_TABLE}({FEATURE_KEY_COLUMN}, {FEATURE_NAME_COLUMN}) \
                     VALUES (?, ?)"
                ),
                vec![SqlValue::Text(feature_id.to_string()), SqlValue::Text(name.clone())],
            ),
            Statement::UpsertCatalogEntry {
                feature_id,
                feature_name: None,
            } => RenderedStatement::with_params(
                format!("UPSERT INTO {CATALOG_TABLE}({FEATURE_KEY_COLUMN}) VALUES (?)"),
                vec![SqlValue::Text(feature_id.to_string())],
            ),
            Statement::UpsertSampleRow {
                sample_id,
                cells,
            } => {
                let mut columns = vec![SAMPLE_KEY_COLUMN];
                columns.extend(cells.iter().map(|cell| cell.feature_id.as_str()));
                let mut params = vec![SqlValue::Text(sample_id.to_string())];
                params.extend(cells.iter().map(|cell| SqlValue::from(&cell.value)));
                RenderedStatement::with_params(
                    format!(
                        "UPSERT INTO {ROW_STORE_TABLE}({}) VALUES ({})",
                        columns.join(", "),
                        placeholders(params.len())
                    ),
                    params,
                )
            }
            Statement::SelectKnownFeatures {
                feature_ids,
            } => RenderedStatement::with_params(
                format!(
                    "SELECT {FEATURE_KEY_COLUMN} FROM {CATALOG_TABLE} WHERE \
                     UPPER({FEATURE_KEY_COLUMN}) IN ({})",
                    placeholders(feature_ids.len())
                ),
                feature_ids
                    .iter()
                    .map(|id| SqlValue::Text(id.as_str().to_ascii_uppercase()))
                    .collect(),
            ),
            Statement::ListFeatureIds(page) => RenderedStatement::bare(format!(
                "SELECT {FEATURE_KEY_COLUMN} FROM {CATALOG_TABLE} LIMIT {} OFFSET {}",
                page.limit, page.offset
            )),
            Statement::ListFeatureRecords(page) => RenderedStatement::bare(format!(
                "SELECT {FEATURE_KEY_COLUMN}, {FEATURE_NAME_COLUMN} FROM {CATALOG_TABLE} LIMIT {} \
                 OFFSET {}",
                page.limit, page.offset
            )),
            Statement::ListSampleIds(page) => RenderedStatement::bare(format!(
                "SELECT {SAMPLE_KEY_COLUMN} FROM {ROW_STORE_TABLE} LIMIT {} OFFSET {}",
                page.limit, page.offset
            )),
            Statement::Project(projection) => render_projection(projection, |name| name.to_string()),
        };
        vec![rendered]
    }
}

/// Renders a projection with the supplied identifier formatter.
///
/// An empty sample filter renders `WHERE 1 = 0` so the query stays valid and
/// returns no rows.
pub fn render_projection(
    projection: &Projection,
    identifier: impl Fn(&str) -> String,
) -> RenderedStatement {
    let columns = projection
        .column_labels()
        .into_iter()
        .map(&identifier)
        .collect::<Vec<_>>()
        .join(", ");
    let table = identifier(ROW_STORE_TABLE);
    if projection.sample_ids().is_empty() {
        return RenderedStatement::bare(format!("SELECT {columns} FROM {table} WHERE 1 = 0"));
    }
    RenderedStatement::with_params(
        format!(
            "SELECT {columns} FROM {table} WHERE {} IN ({})",
            identifier(SAMPLE_KEY_COLUMN),
            placeholders(projection.sample_ids().len())
        ),
        projection.sample_ids().iter().map(|id| SqlValue::Text(id.to_string())).collect(),
    )
}
