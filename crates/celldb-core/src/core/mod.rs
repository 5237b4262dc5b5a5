// crates/celldb-core/src/core/mod.rs
// ============================================================================
// Module: CellDB Core Types
// Description: Identifiers, values, and record shapes.
// Purpose: Group the data model shared by every CellDB component.
// Dependencies: crate::core::{identifiers, records, value}
// ============================================================================

//! ## Overview
//! Data model for the sample × feature matrix: validated identifiers, the
//! fixed-precision value type, and the records returned by read operations.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod records;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::FeatureId;
pub use identifiers::IdentifierError;
pub use identifiers::MAX_FEATURE_ID_LENGTH;
pub use identifiers::MAX_SAMPLE_ID_LENGTH;
pub use identifiers::SampleId;
pub use records::DEFAULT_FEATURE_PAGE_LIMIT;
pub use records::DEFAULT_SAMPLE_PAGE_LIMIT;
pub use records::FeatureRecord;
pub use records::MatrixRow;
pub use records::PageRequest;
pub use value::DecimalType;
pub use value::ExpressionValue;
pub use value::MAX_DECIMAL_PRECISION;
pub use value::ValueError;
