// crates/celldb-core/src/core/records.rs
// ============================================================================
// Module: CellDB Records
// Description: Catalog entries, matrix rows, and pagination requests.
// Purpose: Typed shapes for data read back from the row store and catalog.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Result shapes returned by the catalog, listing, and matrix operations.
//! Matrix cells are optional because the row store is sparse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::FeatureId;
use crate::core::identifiers::SampleId;
use crate::core::value::ExpressionValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default feature page size for catalog listings.
pub const DEFAULT_FEATURE_PAGE_LIMIT: u64 = 200_000;
/// Default sample page size for row-store listings.
pub const DEFAULT_SAMPLE_PAGE_LIMIT: u64 = 1_000_000;

// ============================================================================
// SECTION: Pagination
// ============================================================================

/// Limit/offset window over a listing in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of entries returned.
    pub limit: u64,
    /// Number of entries skipped.
    pub offset: u64,
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit,
            offset,
        }
    }

    /// First page of the feature catalog with the default size.
    #[must_use]
    pub const fn features_default() -> Self {
        Self::new(DEFAULT_FEATURE_PAGE_LIMIT, 0)
    }

    /// First page of the sample listing with the default size.
    #[must_use]
    pub const fn samples_default() -> Self {
        Self::new(DEFAULT_SAMPLE_PAGE_LIMIT, 0)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Catalog entry for a known feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature identifier (column name).
    pub feature_id: FeatureId,
    /// Optional human-readable name.
    pub feature_name: Option<String>,
}

/// One row of a reconstructed expression matrix.
///
/// `values[i]` belongs to the i-th requested feature; `None` marks a cell that
/// was never written for this sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    /// Row label.
    pub sample_id: SampleId,
    /// Cells aligned to the requested feature order.
    pub values: Vec<Option<ExpressionValue>>,
}
