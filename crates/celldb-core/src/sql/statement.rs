// crates/celldb-core/src/sql/statement.rs
// ============================================================================
// Module: CellDB Statements
// Description: Structured statement intent for the row store and catalog.
// Purpose: Describe every statement CellDB issues without building SQL text.
// Dependencies: bigdecimal, serde, crate::core
// ============================================================================

//! ## Overview
//! A [`Statement`] names an operation, the identifiers it touches, and the
//! typed values it binds. Rendering to SQL text is the job of a
//! [`Dialect`](crate::sql::Dialect); executors may also interpret statements
//! directly (see [`InMemoryExecutor`](crate::runtime::InMemoryExecutor)).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::core::DecimalType;
use crate::core::ExpressionValue;
use crate::core::FeatureId;
use crate::core::PageRequest;
use crate::core::SampleId;

// ============================================================================
// SECTION: Relation Names
// ============================================================================

/// Wide row store: one row per sample, one column per feature.
pub const ROW_STORE_TABLE: &str = "Expressions";
/// Feature catalog relation.
pub const CATALOG_TABLE: &str = "Features";
/// Primary key column of the row store.
pub const SAMPLE_KEY_COLUMN: &str = "sampleId";
/// Primary key column of the catalog.
pub const FEATURE_KEY_COLUMN: &str = "featureId";
/// Optional display-name column of the catalog.
pub const FEATURE_NAME_COLUMN: &str = "featureName";

/// Base relations created by initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The wide row store.
    RowStore,
    /// The feature catalog.
    Catalog,
}

impl Relation {
    /// Returns the table name for the relation.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::RowStore => ROW_STORE_TABLE,
            Self::Catalog => CATALOG_TABLE,
        }
    }
}

// ============================================================================
// SECTION: Bound Values
// ============================================================================

/// Value bound into or read out of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Text value (identifiers, names).
    Text(String),
    /// Decimal value (feature cells).
    Decimal(BigDecimal),
}

impl From<&ExpressionValue> for SqlValue {
    fn from(value: &ExpressionValue) -> Self {
        Self::Decimal(value.as_decimal().clone())
    }
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// One cell written by a sample upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCell {
    /// Target column.
    pub feature_id: FeatureId,
    /// Conformed value.
    pub value: ExpressionValue,
}

/// Structured statement intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create one of the base relations.
    CreateRelation(Relation),
    /// Add one decimal column per feature to the row store.
    AddFeatureColumns {
        /// Columns to add, in order.
        feature_ids: Vec<FeatureId>,
        /// Declared type for every new column.
        column_type: DecimalType,
    },
    /// Insert or update one catalog entry. A `None` name keeps any stored name.
    UpsertCatalogEntry {
        /// Catalog key.
        feature_id: FeatureId,
        /// Optional display name.
        feature_name: Option<String>,
    },
    /// Insert or update one row, touching only the named columns.
    UpsertSampleRow {
        /// Row key.
        sample_id: SampleId,
        /// Columns and values written.
        cells: Vec<FeatureCell>,
    },
    /// Select cataloged feature ids equal to one of the given ids, ignoring
    /// ASCII case. Rows carry the cataloged spelling.
    SelectKnownFeatures {
        /// Candidate identifiers.
        feature_ids: Vec<FeatureId>,
    },
    /// Page of catalog feature ids.
    ListFeatureIds(PageRequest),
    /// Page of catalog feature ids with names.
    ListFeatureRecords(PageRequest),
    /// Page of row-store sample ids.
    ListSampleIds(PageRequest),
    /// Sample × feature projection.
    Project(Projection),
}

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Projection of the row store onto a sample and feature subset.
///
/// # Invariants
/// - Output columns are `[sampleId, feature_ids...]` in caller order.
/// - `sample_ids` holds no duplicates (first occurrence kept).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Row filter.
    sample_ids: Vec<SampleId>,
    /// Projected feature columns.
    feature_ids: Vec<FeatureId>,
}

impl Projection {
    /// Builds a projection; never fails.
    #[must_use]
    pub fn new(sample_ids: &[SampleId], feature_ids: &[FeatureId]) -> Self {
        let mut seen = HashSet::with_capacity(sample_ids.len());
        let sample_ids =
            sample_ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();
        Self {
            sample_ids,
            feature_ids: feature_ids.to_vec(),
        }
    }

    /// Returns the deduplicated row filter.
    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    /// Returns the projected feature columns.
    #[must_use]
    pub fn feature_ids(&self) -> &[FeatureId] {
        &self.feature_ids
    }

    /// Returns the output column labels, key column first.
    #[must_use]
    pub fn column_labels(&self) -> Vec<&str> {
        std::iter::once(SAMPLE_KEY_COLUMN)
            .chain(self.feature_ids.iter().map(FeatureId::as_str))
            .collect()
    }
}
