// crates/celldb-core/src/runtime/celldb.rs
// ============================================================================
// Module: CellDB Facade
// Description: Owned entry point bundling executor, schema config, and audit.
// Purpose: Single handle for every catalog, evolution, upsert, and read call.
// Dependencies: serde, crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`CellDb`] owns a [`StatementExecutor`] and hands it to the component
//! views ([`SchemaCatalog`], [`SchemaEvolver`], [`UpsertEngine`],
//! [`MatrixQueryBuilder`], [`CatalogListing`]) per call. The decimal column
//! type lives in [`SchemaConfig`] rather than in any global.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::core::DecimalType;
use crate::core::ExpressionValue;
use crate::core::FeatureId;
use crate::core::FeatureRecord;
use crate::core::MatrixRow;
use crate::core::PageRequest;
use crate::core::SampleId;
use crate::interfaces::StatementExecutor;
use crate::runtime::audit::CellDbAuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::catalog::SchemaCatalog;
use crate::runtime::error::CellDbError;
use crate::runtime::evolver::EvolutionOutcome;
use crate::runtime::evolver::SchemaEvolver;
use crate::runtime::init::InitReport;
use crate::runtime::init::initialize;
use crate::runtime::listing::CatalogListing;
use crate::runtime::matrix::MatrixQueryBuilder;
use crate::runtime::upsert::UpsertEngine;
use crate::runtime::upsert::UpsertReport;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Schema settings shared by every feature column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchemaConfig {
    /// Declared type of every feature column.
    pub column_type: DecimalType,
}

// ============================================================================
// SECTION: Facade
// ============================================================================

/// CellDB handle over an owned executor.
pub struct CellDb<E: StatementExecutor> {
    /// Statement executor.
    executor: E,
    /// Schema settings.
    schema: SchemaConfig,
    /// Audit sink shared by every component.
    audit: Arc<dyn CellDbAuditSink>,
}

impl<E: StatementExecutor> CellDb<E> {
    /// Creates a handle that discards audit events.
    #[must_use]
    pub fn new(executor: E, schema: SchemaConfig) -> Self {
        Self {
            executor,
            schema,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn CellDbAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the schema settings.
    pub const fn schema(&self) -> SchemaConfig {
        self.schema
    }

    /// Creates the row store and catalog; failures are reported, not returned.
    pub fn initialize(&self) -> InitReport {
        initialize(&self.executor, self.audit.as_ref())
    }

    /// See [`SchemaCatalog::register_feature`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the write fails.
    pub fn register_feature(
        &self,
        feature_id: &FeatureId,
        feature_name: Option<&str>,
    ) -> Result<(), CellDbError> {
        self.catalog().register_feature(feature_id, feature_name)
    }

    /// See [`SchemaCatalog::register_features`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::ArityMismatch`] before any write, or the first
    /// failing write.
    pub fn register_features<S: AsRef<str>>(
        &self,
        feature_ids: &[FeatureId],
        feature_names: Option<&[S]>,
    ) -> Result<(), CellDbError> {
        self.catalog().register_features(feature_ids, feature_names)
    }

    /// See [`SchemaCatalog::list_features`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails.
    pub fn list_features(&self, page: PageRequest) -> Result<Vec<FeatureId>, CellDbError> {
        CatalogListing::new(&self.executor).list_features(page)
    }

    /// See [`SchemaCatalog::list_feature_records`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails.
    pub fn list_feature_records(
        &self,
        page: PageRequest,
    ) -> Result<Vec<FeatureRecord>, CellDbError> {
        self.catalog().list_feature_records(page)
    }

    /// See [`SchemaCatalog::known_features`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails.
    pub fn known_features(
        &self,
        feature_ids: &[FeatureId],
    ) -> Result<HashSet<FeatureId>, CellDbError> {
        self.catalog().known_features(feature_ids)
    }

    /// See [`SchemaEvolver::ensure_columns`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::SchemaConflict`] when any column already exists.
    pub fn ensure_columns(&self, feature_ids: &[FeatureId]) -> Result<(), CellDbError> {
        self.evolver().ensure_columns(feature_ids)
    }

    /// See [`SchemaEvolver::evolve`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] for duplicate ids or non-conflict failures.
    pub fn evolve(&self, feature_ids: &[FeatureId]) -> Result<EvolutionOutcome, CellDbError> {
        self.evolver().evolve(feature_ids)
    }

    /// See [`UpsertEngine::upsert_sample`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] on validation or backend failure.
    pub fn upsert_sample(
        &self,
        sample_id: &SampleId,
        feature_ids: &[FeatureId],
        values: &[ExpressionValue],
        evolve_schema: bool,
    ) -> Result<UpsertReport, CellDbError> {
        self.upserts().upsert_sample(sample_id, feature_ids, values, evolve_schema)
    }

    /// See [`UpsertEngine::upsert_samples`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] on validation or backend failure.
    pub fn upsert_samples(
        &self,
        sample_ids: &[SampleId],
        feature_ids: &[FeatureId],
        vectors: &[Vec<ExpressionValue>],
    ) -> Result<UpsertReport, CellDbError> {
        self.upserts().upsert_samples(sample_ids, feature_ids, vectors)
    }

    /// See [`UpsertEngine::upsert_feature`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] on evolution or registration failure.
    pub fn upsert_feature(
        &self,
        feature_id: &FeatureId,
        feature_name: Option<&str>,
    ) -> Result<EvolutionOutcome, CellDbError> {
        self.upserts().upsert_feature(feature_id, feature_name)
    }

    /// See [`UpsertEngine::upsert_features`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::ArityMismatch`] before any I/O, or the first backend
    /// failure.
    pub fn upsert_features<S: AsRef<str>>(
        &self,
        feature_ids: &[FeatureId],
        feature_names: Option<&[S]>,
    ) -> Result<EvolutionOutcome, CellDbError> {
        self.upserts().upsert_features(feature_ids, feature_names)
    }

    /// See [`MatrixQueryBuilder::matrix`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError::UnknownColumn`] for features without a column.
    pub fn matrix(
        &self,
        sample_ids: &[SampleId],
        feature_ids: &[FeatureId],
    ) -> Result<Vec<MatrixRow>, CellDbError> {
        MatrixQueryBuilder::new(&self.executor).matrix(sample_ids, feature_ids)
    }

    /// See [`CatalogListing::list_samples`].
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails.
    pub fn list_samples(&self, page: PageRequest) -> Result<Vec<SampleId>, CellDbError> {
        CatalogListing::new(&self.executor).list_samples(page)
    }

    /// Catalog view.
    fn catalog(&self) -> SchemaCatalog<'_, E> {
        SchemaCatalog::new(&self.executor, self.audit.as_ref())
    }

    /// Evolver view.
    fn evolver(&self) -> SchemaEvolver<'_, E> {
        SchemaEvolver::new(&self.executor, self.schema.column_type, self.audit.as_ref())
    }

    /// Upsert view.
    fn upserts(&self) -> UpsertEngine<'_, E> {
        UpsertEngine::new(&self.executor, self.schema.column_type, self.audit.as_ref())
    }
}
