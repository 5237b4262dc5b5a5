// crates/celldb-core/src/runtime/matrix.rs
// ============================================================================
// Module: CellDB Matrix Query Builder
// Description: Sample × feature projections over the row store.
// Purpose: Reconstruct arbitrary sub-matrices from the wide table.
// Dependencies: crate::{core, interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! [`build_projection`] is pure and never fails. [`MatrixQueryBuilder::matrix`]
//! executes the projection and decodes each row into a [`MatrixRow`] whose
//! cells line up with the requested feature order. Rows come back in request
//! order regardless of the order the backend produced them; samples never
//! stored are absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use crate::core::FeatureId;
use crate::core::MatrixRow;
use crate::core::SampleId;
use crate::interfaces::ResultRow;
use crate::interfaces::StatementExecutor;
use crate::runtime::error::CellDbError;
use crate::runtime::rows::cell_at;
use crate::runtime::rows::sample_id_at;
use crate::sql::Projection;
use crate::sql::Statement;

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Builds the projection statement for a sample and feature subset.
///
/// Empty `sample_ids` yields a statement returning no rows; empty
/// `feature_ids` yields a key-only projection. Feature ids are not checked
/// against the catalog.
#[must_use]
pub fn build_projection(sample_ids: &[SampleId], feature_ids: &[FeatureId]) -> Statement {
    Statement::Project(Projection::new(sample_ids, feature_ids))
}

// ============================================================================
// SECTION: Matrix Query Builder
// ============================================================================

/// Matrix reads over a borrowed executor.
pub struct MatrixQueryBuilder<'a, E: StatementExecutor + ?Sized> {
    /// Statement executor.
    executor: &'a E,
}

impl<'a, E: StatementExecutor + ?Sized> MatrixQueryBuilder<'a, E> {
    /// Creates a matrix reader.
    pub const fn new(executor: &'a E) -> Self {
        Self {
            executor,
        }
    }

    /// Returns the stored cells for the requested samples and features.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::UnknownColumn`] when a feature has no column,
    /// [`CellDbError::InvalidRow`] when the backend returns a malformed row, or
    /// [`CellDbError::Backend`] for other failures.
    pub fn matrix(
        &self,
        sample_ids: &[SampleId],
        feature_ids: &[FeatureId],
    ) -> Result<Vec<MatrixRow>, CellDbError> {
        let projection = Projection::new(sample_ids, feature_ids);
        let rank: HashMap<&str, usize> = projection
            .sample_ids()
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();
        let fetched = self.executor.fetch_all(&Statement::Project(projection.clone()))?;
        let mut ranked = Vec::with_capacity(fetched.len());
        for row in &fetched {
            let decoded = decode_row(row, feature_ids.len())?;
            let position = rank.get(decoded.sample_id.as_str()).copied().ok_or_else(|| {
                CellDbError::InvalidRow(format!(
                    "backend returned unrequested sample {}",
                    decoded.sample_id
                ))
            })?;
            ranked.push((position, decoded));
        }
        ranked.sort_by_key(|(position, _)| *position);
        Ok(ranked.into_iter().map(|(_, row)| row).collect())
    }
}

/// Decodes `[sampleId, cells...]` with exactly `feature_count` cells.
fn decode_row(row: &ResultRow, feature_count: usize) -> Result<MatrixRow, CellDbError> {
    if row.len() != feature_count + 1 {
        return Err(CellDbError::InvalidRow(format!(
            "expected {} columns, row has {}",
            feature_count + 1,
            row.len()
        )));
    }
    let sample_id = sample_id_at(row, 0)?;
    let values = (1 ..= feature_count).map(|index| cell_at(row, index)).collect::<Result<_, _>>()?;
    Ok(MatrixRow {
        sample_id,
        values,
    })
}
