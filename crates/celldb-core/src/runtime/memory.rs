// crates/celldb-core/src/runtime/memory.rs
// ============================================================================
// Module: CellDB In-Memory Executor
// Description: Statement interpreter over in-process tables.
// Purpose: Run the full CellDB stack without a database, for tests and demos.
// Dependencies: bigdecimal, crate::{core, interfaces, sql}
// ============================================================================

//! ## Overview
//! [`InMemoryExecutor`] interprets [`Statement`]s directly instead of rendering
//! SQL. It follows the same failure classification a SQL backend reports:
//! adding an existing column is a schema conflict (and adds nothing), writing
//! or projecting a missing column is an unknown column, and creating an
//! existing relation is a backend error. Column names compare ASCII
//! case-insensitively, as unquoted SQL identifiers do. Every statement is
//! logged so tests can assert on what was issued.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use bigdecimal::BigDecimal;

use crate::core::PageRequest;
use crate::interfaces::ExecutionError;
use crate::interfaces::ResultRow;
use crate::interfaces::StatementExecutor;
use crate::sql::FeatureCell;
use crate::sql::Projection;
use crate::sql::Relation;
use crate::sql::SqlValue;
use crate::sql::Statement;

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Wide row store contents.
#[derive(Debug, Default)]
struct RowStore {
    /// Declared feature columns by lowercase name.
    columns: HashSet<String>,
    /// Rows in insertion order.
    rows: Vec<(String, HashMap<String, BigDecimal>)>,
    /// Row position by sample id.
    index: HashMap<String, usize>,
}

/// Feature catalog contents.
#[derive(Debug, Default)]
struct Catalog {
    /// Entries in insertion order.
    entries: Vec<(String, Option<String>)>,
    /// Entry position by feature id.
    index: HashMap<String, usize>,
}

/// Interpreter state.
#[derive(Debug, Default)]
struct State {
    /// Row store, once created.
    row_store: Option<RowStore>,
    /// Catalog, once created.
    catalog: Option<Catalog>,
    /// Every statement received, in order.
    log: Vec<Statement>,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// In-memory statement executor for tests and examples.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutor {
    /// Interpreter state protected by a mutex.
    state: Arc<Mutex<State>>,
}

impl InMemoryExecutor {
    /// Creates an executor with no relations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every statement received so far, including failed ones.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        self.state.lock().map(|state| state.log.clone()).unwrap_or_default()
    }

    /// Clears the statement log.
    pub fn clear_statements(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.log.clear();
        }
    }

    /// Runs one statement under the lock.
    fn run(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ExecutionError::Backend("in-memory store lock poisoned".to_string()))?;
        state.log.push(statement.clone());
        state.apply(statement)
    }
}

impl StatementExecutor for InMemoryExecutor {
    fn execute(&self, statement: &Statement) -> Result<(), ExecutionError> {
        self.run(statement).map(|_| ())
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        self.run(statement)
    }
}

// ============================================================================
// SECTION: Interpreter
// ============================================================================

impl State {
    /// Applies a statement, returning any result rows.
    fn apply(&mut self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        match statement {
            Statement::CreateRelation(relation) => {
                self.create(*relation)?;
                Ok(Vec::new())
            }
            Statement::AddFeatureColumns {
                feature_ids,
                ..
            } => {
                let store = self.row_store_mut()?;
                let mut pending = HashSet::with_capacity(feature_ids.len());
                for feature_id in feature_ids {
                    let key = column_key(feature_id.as_str());
                    if store.columns.contains(&key) || !pending.insert(key) {
                        return Err(ExecutionError::SchemaConflict(format!(
                            "duplicate column name: {feature_id}"
                        )));
                    }
                }
                store.columns.extend(pending);
                Ok(Vec::new())
            }
            Statement::UpsertCatalogEntry {
                feature_id,
                feature_name,
            } => {
                let catalog = self.catalog_mut()?;
                let key = feature_id.to_string();
                if let Some(&position) = catalog.index.get(&key) {
                    if let Some(name) = feature_name
                        && let Some(entry) = catalog.entries.get_mut(position)
                    {
                        entry.1 = Some(name.clone());
                    }
                } else {
                    catalog.index.insert(key.clone(), catalog.entries.len());
                    catalog.entries.push((key, feature_name.clone()));
                }
                Ok(Vec::new())
            }
            Statement::UpsertSampleRow {
                sample_id,
                cells,
            } => {
                self.row_store_mut()?.upsert(sample_id.as_str(), cells)?;
                Ok(Vec::new())
            }
            Statement::SelectKnownFeatures {
                feature_ids,
            } => {
                let catalog = self.catalog_ref()?;
                let wanted: HashSet<String> =
                    feature_ids.iter().map(|id| column_key(id.as_str())).collect();
                Ok(catalog
                    .entries
                    .iter()
                    .filter(|(id, _)| wanted.contains(&column_key(id)))
                    .map(|(id, _)| vec![SqlValue::Text(id.clone())])
                    .collect())
            }
            Statement::ListFeatureIds(page) => {
                let entries = &self.catalog_ref()?.entries;
                Ok(paginate(entries, *page).map(|(id, _)| vec![SqlValue::Text(id.clone())]).collect())
            }
            Statement::ListFeatureRecords(page) => {
                let entries = &self.catalog_ref()?.entries;
                Ok(paginate(entries, *page)
                    .map(|(id, name)| {
                        vec![
                            SqlValue::Text(id.clone()),
                            name.clone().map_or(SqlValue::Null, SqlValue::Text),
                        ]
                    })
                    .collect())
            }
            Statement::ListSampleIds(page) => {
                let rows = &self.row_store_ref()?.rows;
                Ok(paginate(rows, *page).map(|(id, _)| vec![SqlValue::Text(id.clone())]).collect())
            }
            Statement::Project(projection) => self.row_store_ref()?.project(projection),
        }
    }

    /// Creates a relation, failing if it exists.
    fn create(&mut self, relation: Relation) -> Result<(), ExecutionError> {
        let exists = match relation {
            Relation::RowStore => self.row_store.is_some(),
            Relation::Catalog => self.catalog.is_some(),
        };
        if exists {
            return Err(ExecutionError::Backend(format!(
                "table {} already exists",
                relation.table_name()
            )));
        }
        match relation {
            Relation::RowStore => self.row_store = Some(RowStore::default()),
            Relation::Catalog => self.catalog = Some(Catalog::default()),
        }
        Ok(())
    }

    /// Returns the row store or a missing-table error.
    fn row_store_ref(&self) -> Result<&RowStore, ExecutionError> {
        self.row_store.as_ref().ok_or_else(|| missing_table(Relation::RowStore))
    }

    /// Returns the row store mutably or a missing-table error.
    fn row_store_mut(&mut self) -> Result<&mut RowStore, ExecutionError> {
        self.row_store.as_mut().ok_or_else(|| missing_table(Relation::RowStore))
    }

    /// Returns the catalog or a missing-table error.
    fn catalog_ref(&self) -> Result<&Catalog, ExecutionError> {
        self.catalog.as_ref().ok_or_else(|| missing_table(Relation::Catalog))
    }

    /// Returns the catalog mutably or a missing-table error.
    fn catalog_mut(&mut self) -> Result<&mut Catalog, ExecutionError> {
        self.catalog.as_mut().ok_or_else(|| missing_table(Relation::Catalog))
    }
}

impl RowStore {
    /// Fails unless `name` is a declared feature column.
    fn require_column(&self, name: &str) -> Result<String, ExecutionError> {
        let key = column_key(name);
        if self.columns.contains(&key) {
            Ok(key)
        } else {
            Err(ExecutionError::UnknownColumn(format!("no such column: {name}")))
        }
    }

    /// Writes the named cells, keeping every other column of the row.
    fn upsert(&mut self, sample_id: &str, cells: &[FeatureCell]) -> Result<(), ExecutionError> {
        let keys = cells
            .iter()
            .map(|cell| self.require_column(cell.feature_id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let position = match self.index.get(sample_id) {
            Some(&position) => position,
            None => {
                self.index.insert(sample_id.to_string(), self.rows.len());
                self.rows.push((sample_id.to_string(), HashMap::new()));
                self.rows.len() - 1
            }
        };
        let (_, values) = self.rows.get_mut(position).ok_or_else(|| {
            ExecutionError::Backend(format!("row index out of sync for {sample_id}"))
        })?;
        for (key, cell) in keys.into_iter().zip(cells) {
            values.insert(key, cell.value.as_decimal().clone());
        }
        Ok(())
    }

    /// Evaluates a projection in storage order.
    fn project(&self, projection: &Projection) -> Result<Vec<ResultRow>, ExecutionError> {
        let keys = projection
            .feature_ids()
            .iter()
            .map(|id| self.require_column(id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let wanted: HashSet<&str> = projection.sample_ids().iter().map(|id| id.as_str()).collect();
        Ok(self
            .rows
            .iter()
            .filter(|(sample_id, _)| wanted.contains(sample_id.as_str()))
            .map(|(sample_id, values)| {
                std::iter::once(SqlValue::Text(sample_id.clone()))
                    .chain(keys.iter().map(|key| {
                        values.get(key).cloned().map_or(SqlValue::Null, SqlValue::Decimal)
                    }))
                    .collect()
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes a column name for comparison.
fn column_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Error for a statement against a relation that was never created.
fn missing_table(relation: Relation) -> ExecutionError {
    ExecutionError::Backend(format!("no such table: {}", relation.table_name()))
}

/// Applies a limit/offset window.
fn paginate<T>(items: &[T], page: PageRequest) -> impl Iterator<Item = &T> {
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.iter().skip(offset).take(limit)
}
