// crates/celldb-core/src/runtime/catalog.rs
// ============================================================================
// Module: CellDB Schema Catalog
// Description: Feature registration and catalog reads.
// Purpose: Track which features exist as row-store columns.
// Dependencies: crate::{core, interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! The catalog relation holds one entry per known feature with an optional
//! display name. Registration is an idempotent insert-or-update; a batch is
//! validated up front but written entry by entry, so a backend failure part
//! way through leaves the earlier entries in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use crate::core::FeatureId;
use crate::core::FeatureRecord;
use crate::core::PageRequest;
use crate::interfaces::StatementExecutor;
use crate::runtime::audit::CellDbAuditEvent;
use crate::runtime::audit::CellDbAuditSink;
use crate::runtime::error::CellDbError;
use crate::runtime::error::ensure_arity;
use crate::runtime::rows::feature_id_at;
use crate::runtime::rows::optional_text_at;
use crate::sql::Statement;

// ============================================================================
// SECTION: Schema Catalog
// ============================================================================

/// Feature catalog operations over a borrowed executor.
pub struct SchemaCatalog<'a, E: StatementExecutor + ?Sized> {
    /// Statement executor.
    executor: &'a E,
    /// Audit sink for registration events.
    audit: &'a dyn CellDbAuditSink,
}

impl<'a, E: StatementExecutor + ?Sized> SchemaCatalog<'a, E> {
    /// Creates a catalog view over the executor.
    pub fn new(executor: &'a E, audit: &'a dyn CellDbAuditSink) -> Self {
        Self {
            executor,
            audit,
        }
    }

    /// Inserts or updates one catalog entry. A `None` name keeps any stored name.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the backend write fails.
    pub fn register_feature(
        &self,
        feature_id: &FeatureId,
        feature_name: Option<&str>,
    ) -> Result<(), CellDbError> {
        self.write_entry(feature_id, feature_name)?;
        self.audit.record(&CellDbAuditEvent::features_registered(std::slice::from_ref(feature_id)));
        Ok(())
    }

    /// Registers a batch of features, optionally with names.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::ArityMismatch`] before any write when `feature_names`
    /// is present with a different length, or [`CellDbError`] from the first
    /// failing write.
    pub fn register_features<S: AsRef<str>>(
        &self,
        feature_ids: &[FeatureId],
        feature_names: Option<&[S]>,
    ) -> Result<(), CellDbError> {
        if let Some(names) = feature_names {
            ensure_arity("feature names", feature_ids.len(), names.len())?;
        }
        for (index, feature_id) in feature_ids.iter().enumerate() {
            let name = feature_names.and_then(|names| names.get(index)).map(AsRef::as_ref);
            self.write_entry(feature_id, name)?;
        }
        if !feature_ids.is_empty() {
            self.audit.record(&CellDbAuditEvent::features_registered(feature_ids));
        }
        Ok(())
    }

    /// Returns a page of feature ids in catalog storage order.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails or a row is malformed.
    pub fn list_features(&self, page: PageRequest) -> Result<Vec<FeatureId>, CellDbError> {
        self.executor
            .fetch_all(&Statement::ListFeatureIds(page))?
            .iter()
            .map(|row| feature_id_at(row, 0))
            .collect()
    }

    /// Returns a page of catalog entries with their names.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails or a row is malformed.
    pub fn list_feature_records(
        &self,
        page: PageRequest,
    ) -> Result<Vec<FeatureRecord>, CellDbError> {
        self.executor
            .fetch_all(&Statement::ListFeatureRecords(page))?
            .iter()
            .map(|row| -> Result<FeatureRecord, CellDbError> {
                Ok(FeatureRecord {
                    feature_id: feature_id_at(row, 0)?,
                    feature_name: optional_text_at(row, 1)?,
                })
            })
            .collect()
    }

    /// Returns the ids from `feature_ids` already present in the catalog.
    ///
    /// Issues no statement for an empty input.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails or a row is malformed.
    pub fn known_features(
        &self,
        feature_ids: &[FeatureId],
    ) -> Result<HashSet<FeatureId>, CellDbError> {
        let requested: HashSet<&FeatureId> = feature_ids.iter().collect();
        Ok(self
            .cataloged_spellings(feature_ids)?
            .into_values()
            .filter(|cataloged| requested.contains(cataloged))
            .collect())
    }

    /// Returns the cataloged ids matching `feature_ids` ignoring ASCII case,
    /// keyed by lowercase id.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails or a row is malformed.
    pub(crate) fn cataloged_spellings(
        &self,
        feature_ids: &[FeatureId],
    ) -> Result<HashMap<String, FeatureId>, CellDbError> {
        if feature_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let statement = Statement::SelectKnownFeatures {
            feature_ids: feature_ids.to_vec(),
        };
        self.executor
            .fetch_all(&statement)?
            .iter()
            .map(|row| {
                let cataloged = feature_id_at(row, 0)?;
                Ok((cataloged.as_str().to_ascii_lowercase(), cataloged))
            })
            .collect()
    }

    /// Writes one catalog entry.
    fn write_entry(
        &self,
        feature_id: &FeatureId,
        feature_name: Option<&str>,
    ) -> Result<(), CellDbError> {
        let statement = Statement::UpsertCatalogEntry {
            feature_id: feature_id.clone(),
            feature_name: feature_name.map(ToString::to_string),
        };
        self.executor.execute(&statement)?;
        Ok(())
    }
}
