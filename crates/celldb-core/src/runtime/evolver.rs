// crates/celldb-core/src/runtime/evolver.rs
// ============================================================================
// Module: CellDB Schema Evolver
// Description: Column additions for newly seen features.
// Purpose: Guarantee a column exists before any value is written under it.
// Dependencies: crate::{core, interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! [`SchemaEvolver::ensure_columns`] is the strict primitive: one alteration
//! statement, failing with [`CellDbError::SchemaConflict`] if any column
//! already exists. [`SchemaEvolver::evolve`] is what the write paths use: it
//! subtracts features the catalog already knows, adds the rest in one
//! statement, and on a conflict falls back to one column at a time so that a
//! column left behind without a catalog entry does not block the write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use serde::Serialize;

use crate::core::DecimalType;
use crate::core::FeatureId;
use crate::interfaces::StatementExecutor;
use crate::runtime::audit::CellDbAuditEvent;
use crate::runtime::audit::CellDbAuditSink;
use crate::runtime::catalog::SchemaCatalog;
use crate::runtime::error::CellDbError;
use crate::sql::Statement;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a minimal schema evolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvolutionOutcome {
    /// Columns added by this call.
    pub added: Vec<FeatureId>,
    /// Features already present in the catalog; no statement issued for them.
    pub already_present: Vec<FeatureId>,
    /// Columns found to exist only when the addition was attempted.
    pub suppressed_conflicts: Vec<FeatureId>,
}

// ============================================================================
// SECTION: Schema Evolver
// ============================================================================

/// Row-store schema evolution over a borrowed executor.
pub struct SchemaEvolver<'a, E: StatementExecutor + ?Sized> {
    /// Statement executor.
    executor: &'a E,
    /// Declared type for new feature columns.
    column_type: DecimalType,
    /// Audit sink for evolution events.
    audit: &'a dyn CellDbAuditSink,
}

impl<'a, E: StatementExecutor + ?Sized> SchemaEvolver<'a, E> {
    /// Creates an evolver adding columns of `column_type`.
    pub fn new(executor: &'a E, column_type: DecimalType, audit: &'a dyn CellDbAuditSink) -> Self {
        Self {
            executor,
            column_type,
            audit,
        }
    }

    /// Adds one column per feature in a single statement.
    ///
    /// An empty list issues no statement.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::DuplicateFeature`] before any I/O for repeated ids,
    /// [`CellDbError::SchemaConflict`] when a column already exists, or
    /// [`CellDbError::Backend`] for other failures.
    pub fn ensure_columns(&self, feature_ids: &[FeatureId]) -> Result<(), CellDbError> {
        ensure_unique(feature_ids)?;
        if feature_ids.is_empty() {
            return Ok(());
        }
        self.add_columns(feature_ids)?;
        self.audit.record(&CellDbAuditEvent::schema_evolved(feature_ids));
        Ok(())
    }

    /// Adds columns only for features the catalog does not know yet.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::DuplicateFeature`] before any I/O for repeated ids
    /// and before any alteration for an id whose catalog entry differs only in
    /// case, or the first non-conflict backend failure.
    pub fn evolve(&self, feature_ids: &[FeatureId]) -> Result<EvolutionOutcome, CellDbError> {
        ensure_unique(feature_ids)?;
        let cataloged =
            SchemaCatalog::new(self.executor, self.audit).cataloged_spellings(feature_ids)?;
        for feature_id in feature_ids {
            if let Some(existing) = cataloged.get(&feature_id.as_str().to_ascii_lowercase())
                && existing != feature_id
            {
                return Err(CellDbError::DuplicateFeature(format!(
                    "{feature_id} (cataloged as {existing})"
                )));
            }
        }
        let (already_present, missing): (Vec<FeatureId>, Vec<FeatureId>) = feature_ids
            .iter()
            .cloned()
            .partition(|id| cataloged.contains_key(&id.as_str().to_ascii_lowercase()));
        let mut outcome = EvolutionOutcome {
            already_present,
            ..EvolutionOutcome::default()
        };
        if missing.is_empty() {
            return Ok(outcome);
        }
        match self.add_columns(&missing) {
            Ok(()) => outcome.added = missing,
            Err(CellDbError::SchemaConflict(_)) => {
                for feature_id in missing {
                    match self.add_columns(std::slice::from_ref(&feature_id)) {
                        Ok(()) => outcome.added.push(feature_id),
                        Err(CellDbError::SchemaConflict(message)) => {
                            self.audit.record(&CellDbAuditEvent::schema_conflict_suppressed(
                                &feature_id,
                                &message,
                            ));
                            outcome.suppressed_conflicts.push(feature_id);
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            Err(err) => return Err(err),
        }
        if !outcome.added.is_empty() {
            self.audit.record(&CellDbAuditEvent::schema_evolved(&outcome.added));
        }
        Ok(outcome)
    }

    /// Adds columns for cataloged features whose column is missing.
    ///
    /// Used after a write reports an unknown column for a feature `evolve`
    /// trusted the catalog for (a catalog entry registered without its
    /// column). Each feature is tried alone; a conflict means the column is
    /// really there. Returns true when at least one column was added.
    ///
    /// # Errors
    ///
    /// Returns the first non-conflict backend failure.
    pub fn repair(&self, outcome: &mut EvolutionOutcome) -> Result<bool, CellDbError> {
        let mut repaired = Vec::new();
        for feature_id in &outcome.already_present {
            match self.add_columns(std::slice::from_ref(feature_id)) {
                Ok(()) => repaired.push(feature_id.clone()),
                Err(CellDbError::SchemaConflict(_)) => {}
                Err(err) => return Err(err),
            }
        }
        if repaired.is_empty() {
            return Ok(false);
        }
        outcome.already_present.retain(|feature_id| !repaired.contains(feature_id));
        self.audit.record(&CellDbAuditEvent::schema_evolved(&repaired));
        outcome.added.extend(repaired);
        Ok(true)
    }

    /// Issues the alteration statement.
    fn add_columns(&self, feature_ids: &[FeatureId]) -> Result<(), CellDbError> {
        let statement = Statement::AddFeatureColumns {
            feature_ids: feature_ids.to_vec(),
            column_type: self.column_type,
        };
        self.executor.execute(&statement)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fails on the first feature id that appears more than once.
///
/// Column names are compared ASCII case-insensitively, as backends do.
pub(crate) fn ensure_unique(feature_ids: &[FeatureId]) -> Result<(), CellDbError> {
    let mut seen = HashSet::with_capacity(feature_ids.len());
    for feature_id in feature_ids {
        if !seen.insert(feature_id.as_str().to_ascii_lowercase()) {
            return Err(CellDbError::DuplicateFeature(feature_id.to_string()));
        }
    }
    Ok(())
}
