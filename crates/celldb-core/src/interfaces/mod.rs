// crates/celldb-core/src/interfaces/mod.rs
// ============================================================================
// Module: CellDB Interfaces
// Description: Backend-agnostic statement execution interface.
// Purpose: Define the seam between the schema/matrix core and a storage backend.
// Dependencies: thiserror, crate::sql
// ============================================================================

//! ## Overview
//! The core never opens connections. It hands structured [`Statement`]s to a
//! [`StatementExecutor`] supplied by the caller, which renders them for its
//! backend, runs them with autocommit semantics, and classifies failures into
//! [`ExecutionError`] kinds the core can act on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::sql::SqlValue;
use crate::sql::Statement;

// ============================================================================
// SECTION: Rows
// ============================================================================

/// One fetched row, columns in projection order.
pub type ResultRow = Vec<SqlValue>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Classified statement execution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A column being added already exists.
    #[error("schema conflict: {0}")]
    SchemaConflict(String),
    /// A statement referenced a column that does not exist.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes structured statements against a storage backend.
///
/// # Invariants
/// - Each call is one autocommitted unit; a multi-statement rendering of a
///   single [`Statement`] applies fully or not at all.
/// - Implementations serialize their own connection access.
pub trait StatementExecutor {
    /// Executes a statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] when the backend rejects the statement.
    fn execute(&self, statement: &Statement) -> Result<(), ExecutionError>;

    /// Executes a query and returns every result row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] when the backend rejects the query.
    fn fetch_all(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError>;
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for &T {
    fn execute(&self, statement: &Statement) -> Result<(), ExecutionError> {
        (**self).execute(statement)
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        (**self).fetch_all(statement)
    }
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for Arc<T> {
    fn execute(&self, statement: &Statement) -> Result<(), ExecutionError> {
        (**self).execute(statement)
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        (**self).fetch_all(statement)
    }
}
