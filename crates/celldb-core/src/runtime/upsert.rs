// crates/celldb-core/src/runtime/upsert.rs
// ============================================================================
// Module: CellDB Upsert Engine
// Description: Sample-row and feature upserts with schema coverage.
// Purpose: Write per-sample feature vectors under the right columns.
// Dependencies: serde, crate::{core, interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! Every write path validates its whole request (arity, duplicate ids, value
//! range) before the first statement is issued. Schema evolution and catalog
//! registration then run once per call, followed by one row write per sample.
//! Rows are column-level upserts: columns a write does not name keep their
//! stored values.
//!
//! Batches are not transactional. A failure on row `k` leaves rows `< k`
//! written; the error is returned as is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::DecimalType;
use crate::core::ExpressionValue;
use crate::core::FeatureId;
use crate::core::SampleId;
use crate::interfaces::ExecutionError;
use crate::interfaces::StatementExecutor;
use crate::runtime::audit::CellDbAuditEvent;
use crate::runtime::audit::CellDbAuditSink;
use crate::runtime::catalog::SchemaCatalog;
use crate::runtime::error::CellDbError;
use crate::runtime::error::ensure_arity;
use crate::runtime::evolver::EvolutionOutcome;
use crate::runtime::evolver::SchemaEvolver;
use crate::runtime::evolver::ensure_unique;
use crate::sql::FeatureCell;
use crate::sql::Statement;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Summary of a completed upsert call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    /// Sample rows written.
    pub rows_written: usize,
    /// Schema evolution performed, when the call evolved the schema.
    pub evolution: Option<EvolutionOutcome>,
}

// ============================================================================
// SECTION: Upsert Engine
// ============================================================================

/// Upsert operations over a borrowed executor.
pub struct UpsertEngine<'a, E: StatementExecutor + ?Sized> {
    /// Statement executor.
    executor: &'a E,
    /// Column type values are conformed to.
    column_type: DecimalType,
    /// Audit sink for write events.
    audit: &'a dyn CellDbAuditSink,
}

impl<'a, E: StatementExecutor + ?Sized> UpsertEngine<'a, E> {
    /// Creates an upsert engine writing values of `column_type`.
    pub fn new(executor: &'a E, column_type: DecimalType, audit: &'a dyn CellDbAuditSink) -> Self {
        Self {
            executor,
            column_type,
            audit,
        }
    }

    /// Writes one sample row.
    ///
    /// With `evolve_schema` set, missing columns are added and the features
    /// registered (without names) before the row is written.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::ArityMismatch`], [`CellDbError::DuplicateFeature`],
    /// or [`CellDbError::InvalidValue`] before any I/O, or the first backend
    /// failure. Without `evolve_schema`, a missing column surfaces as
    /// [`CellDbError::UnknownColumn`].
    pub fn upsert_sample(
        &self,
        sample_id: &SampleId,
        feature_ids: &[FeatureId],
        values: &[ExpressionValue],
        evolve_schema: bool,
    ) -> Result<UpsertReport, CellDbError> {
        ensure_arity("feature values", feature_ids.len(), values.len())?;
        ensure_unique(feature_ids)?;
        let cells = self.conform_cells(feature_ids, values)?;
        let mut evolution = if evolve_schema {
            Some(self.cover_features(feature_ids, None::<&[&str]>)?)
        } else {
            None
        };
        self.write_row(sample_id, cells, evolution.as_mut())?;
        self.audit.record(&CellDbAuditEvent::samples_upserted(feature_ids, 1));
        Ok(UpsertReport {
            rows_written: 1,
            evolution,
        })
    }

    /// Writes one row per sample, all sharing the same feature list.
    ///
    /// `vectors[k]` is written to `sample_ids[k]`. The schema is evolved once
    /// for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::ArityMismatch`] before any I/O unless there is one
    /// vector per sample and every vector has one value per feature; duplicate
    /// ids and out-of-range values are also rejected up front. Backend failures
    /// on row `k` are returned after rows `< k` were written.
    pub fn upsert_samples(
        &self,
        sample_ids: &[SampleId],
        feature_ids: &[FeatureId],
        vectors: &[Vec<ExpressionValue>],
    ) -> Result<UpsertReport, CellDbError> {
        ensure_arity("sample vectors", sample_ids.len(), vectors.len())?;
        ensure_unique(feature_ids)?;
        let mut rows = Vec::with_capacity(vectors.len());
        for (sample_id, values) in sample_ids.iter().zip(vectors) {
            ensure_arity("feature values", feature_ids.len(), values.len())?;
            rows.push((sample_id, self.conform_cells(feature_ids, values)?));
        }
        let mut evolution = self.cover_features(feature_ids, None::<&[&str]>)?;
        let mut rows_written = 0;
        for (sample_id, cells) in rows {
            self.write_row(sample_id, cells, Some(&mut evolution))?;
            rows_written += 1;
        }
        self.audit.record(&CellDbAuditEvent::samples_upserted(feature_ids, rows_written));
        Ok(UpsertReport {
            rows_written,
            evolution: Some(evolution),
        })
    }

    /// Adds the column for one feature if needed and registers it.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when evolution or registration fails.
    pub fn upsert_feature(
        &self,
        feature_id: &FeatureId,
        feature_name: Option<&str>,
    ) -> Result<EvolutionOutcome, CellDbError> {
        let names = feature_name.map(|name| vec![name]);
        self.cover_features(std::slice::from_ref(feature_id), names.as_deref())
    }

    /// Adds columns for a batch of features if needed and registers them.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::ArityMismatch`] before any I/O when names are given
    /// with a different length, [`CellDbError::DuplicateFeature`] for repeated
    /// ids, or the first backend failure.
    pub fn upsert_features<S: AsRef<str>>(
        &self,
        feature_ids: &[FeatureId],
        feature_names: Option<&[S]>,
    ) -> Result<EvolutionOutcome, CellDbError> {
        if let Some(names) = feature_names {
            ensure_arity("feature names", feature_ids.len(), names.len())?;
        }
        ensure_unique(feature_ids)?;
        self.cover_features(feature_ids, feature_names)
    }

    /// Evolves the schema for `feature_ids`, then writes their catalog entries.
    fn cover_features<S: AsRef<str>>(
        &self,
        feature_ids: &[FeatureId],
        feature_names: Option<&[S]>,
    ) -> Result<EvolutionOutcome, CellDbError> {
        let outcome = SchemaEvolver::new(self.executor, self.column_type, self.audit)
            .evolve(feature_ids)?;
        SchemaCatalog::new(self.executor, self.audit).register_features(feature_ids, feature_names)?;
        Ok(outcome)
    }

    /// Pairs features with conformed values.
    fn conform_cells(
        &self,
        feature_ids: &[FeatureId],
        values: &[ExpressionValue],
    ) -> Result<Vec<FeatureCell>, CellDbError> {
        feature_ids
            .iter()
            .zip(values)
            .map(|(feature_id, value)| -> Result<FeatureCell, CellDbError> {
                Ok(FeatureCell {
                    feature_id: feature_id.clone(),
                    value: self.column_type.conform(value)?,
                })
            })
            .collect()
    }

    /// Issues one row upsert.
    ///
    /// When the schema was evolved for this call and the backend reports an
    /// unknown column, features the catalog vouched for get their columns
    /// repaired and the write is retried once.
    fn write_row(
        &self,
        sample_id: &SampleId,
        cells: Vec<FeatureCell>,
        evolution: Option<&mut EvolutionOutcome>,
    ) -> Result<(), CellDbError> {
        let statement = Statement::UpsertSampleRow {
            sample_id: sample_id.clone(),
            cells,
        };
        match self.executor.execute(&statement) {
            Ok(()) => Ok(()),
            Err(ExecutionError::UnknownColumn(message)) => {
                let Some(outcome) = evolution else {
                    return Err(CellDbError::UnknownColumn(message));
                };
                let evolver = SchemaEvolver::new(self.executor, self.column_type, self.audit);
                if !evolver.repair(outcome)? {
                    return Err(CellDbError::UnknownColumn(message));
                }
                self.executor.execute(&statement)?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
