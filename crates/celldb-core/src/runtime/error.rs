// crates/celldb-core/src/runtime/error.rs
// ============================================================================
// Module: CellDB Errors
// Description: Error taxonomy for catalog, evolution, upsert, and matrix calls.
// Purpose: Separate pre-I/O validation failures from backend-surfaced failures.
// Dependencies: thiserror, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Validation variants ([`CellDbError::ArityMismatch`],
//! [`CellDbError::InvalidIdentifier`], [`CellDbError::DuplicateFeature`],
//! [`CellDbError::InvalidValue`]) are raised before any statement is issued.
//! The remaining variants are surfaced from the executor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::IdentifierError;
use crate::core::ValueError;
use crate::interfaces::ExecutionError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CellDB operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellDbError {
    /// Positional lists of unequal length.
    #[error("arity mismatch: {context} expected {expected} entries, got {actual}")]
    ArityMismatch {
        /// Which pairing was violated.
        context: &'static str,
        /// Length of the reference list.
        expected: usize,
        /// Length of the mismatched list.
        actual: usize,
    },
    /// Identifier failed validation.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),
    /// The same feature id appears twice in one request.
    #[error("duplicate feature id in request: {0}")]
    DuplicateFeature(String),
    /// Value failed conformance to the column type.
    #[error(transparent)]
    InvalidValue(#[from] ValueError),
    /// Column addition targeted an existing column.
    #[error("schema conflict: {0}")]
    SchemaConflict(String),
    /// Query referenced a column that does not exist.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
    /// A fetched row did not have the expected shape.
    #[error("invalid result row: {0}")]
    InvalidRow(String),
}

impl From<ExecutionError> for CellDbError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::SchemaConflict(message) => Self::SchemaConflict(message),
            ExecutionError::UnknownColumn(message) => Self::UnknownColumn(message),
            ExecutionError::Backend(message) => Self::Backend(message),
        }
    }
}

/// Fails with [`CellDbError::ArityMismatch`] when `actual != expected`.
pub(crate) const fn ensure_arity(
    context: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), CellDbError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CellDbError::ArityMismatch {
            context,
            expected,
            actual,
        })
    }
}
