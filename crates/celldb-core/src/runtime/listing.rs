// crates/celldb-core/src/runtime/listing.rs
// ============================================================================
// Module: CellDB Catalog Listing
// Description: Paginated sample and feature listings.
// Purpose: Enumerate what the matrix holds without reading cell values.
// Dependencies: crate::{core, interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! Pages are limit/offset windows over storage order. Nothing pins that order
//! across concurrent writers, so a page sequence may skip or repeat entries
//! while the store is being written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::FeatureId;
use crate::core::PageRequest;
use crate::core::SampleId;
use crate::interfaces::StatementExecutor;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::catalog::SchemaCatalog;
use crate::runtime::error::CellDbError;
use crate::runtime::rows::sample_id_at;
use crate::sql::Statement;

// ============================================================================
// SECTION: Catalog Listing
// ============================================================================

/// Read-only listings over a borrowed executor.
pub struct CatalogListing<'a, E: StatementExecutor + ?Sized> {
    /// Statement executor.
    executor: &'a E,
}

impl<'a, E: StatementExecutor + ?Sized> CatalogListing<'a, E> {
    /// Creates a listing view.
    pub const fn new(executor: &'a E) -> Self {
        Self {
            executor,
        }
    }

    /// Returns a page of sample ids in row-store order.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails or a row is malformed.
    pub fn list_samples(&self, page: PageRequest) -> Result<Vec<SampleId>, CellDbError> {
        self.executor
            .fetch_all(&Statement::ListSampleIds(page))?
            .iter()
            .map(|row| sample_id_at(row, 0))
            .collect()
    }

    /// Returns a page of feature ids in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`CellDbError`] when the query fails or a row is malformed.
    pub fn list_features(&self, page: PageRequest) -> Result<Vec<FeatureId>, CellDbError> {
        SchemaCatalog::new(self.executor, &NoopAuditSink).list_features(page)
    }
}
