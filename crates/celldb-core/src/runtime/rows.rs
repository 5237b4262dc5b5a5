// crates/celldb-core/src/runtime/rows.rs
// ============================================================================
// Module: CellDB Row Decoding
// Description: Conversions from fetched rows into typed records.
// Purpose: Fail closed when a backend returns rows of an unexpected shape.
// Dependencies: crate::{core, interfaces, sql}
// ============================================================================

//! ## Overview
//! Executors return loosely typed [`ResultRow`]s. These helpers check arity
//! and column types before values reach callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ExpressionValue;
use crate::core::FeatureId;
use crate::core::SampleId;
use crate::interfaces::ResultRow;
use crate::runtime::error::CellDbError;
use crate::sql::SqlValue;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the column at `index` or fails with a shape error.
fn column(row: &ResultRow, index: usize) -> Result<&SqlValue, CellDbError> {
    row.get(index).ok_or_else(|| {
        CellDbError::InvalidRow(format!("expected column {index}, row has {}", row.len()))
    })
}

/// Reads a non-null text column.
pub(crate) fn text_at(row: &ResultRow, index: usize) -> Result<&str, CellDbError> {
    match column(row, index)? {
        SqlValue::Text(value) => Ok(value),
        SqlValue::Null => Err(CellDbError::InvalidRow(format!("column {index} is null"))),
        SqlValue::Decimal(_) => {
            Err(CellDbError::InvalidRow(format!("column {index} is numeric, expected text")))
        }
    }
}

/// Reads a nullable text column.
pub(crate) fn optional_text_at(row: &ResultRow, index: usize) -> Result<Option<String>, CellDbError> {
    match column(row, index)? {
        SqlValue::Null => Ok(None),
        SqlValue::Text(value) => Ok(Some(value.clone())),
        SqlValue::Decimal(_) => {
            Err(CellDbError::InvalidRow(format!("column {index} is numeric, expected text")))
        }
    }
}

/// Reads a feature id column.
pub(crate) fn feature_id_at(row: &ResultRow, index: usize) -> Result<FeatureId, CellDbError> {
    FeatureId::new(text_at(row, index)?)
        .map_err(|err| CellDbError::InvalidRow(format!("stored feature id rejected: {err}")))
}

/// Reads a sample id column.
pub(crate) fn sample_id_at(row: &ResultRow, index: usize) -> Result<SampleId, CellDbError> {
    SampleId::new(text_at(row, index)?)
        .map_err(|err| CellDbError::InvalidRow(format!("stored sample id rejected: {err}")))
}

/// Reads a nullable decimal cell; text cells must parse as decimals.
pub(crate) fn cell_at(row: &ResultRow, index: usize) -> Result<Option<ExpressionValue>, CellDbError> {
    match column(row, index)? {
        SqlValue::Null => Ok(None),
        SqlValue::Decimal(value) => Ok(Some(ExpressionValue::new(value.clone()))),
        SqlValue::Text(raw) => raw
            .parse()
            .map(Some)
            .map_err(|err| CellDbError::InvalidRow(format!("column {index}: {err}"))),
    }
}
