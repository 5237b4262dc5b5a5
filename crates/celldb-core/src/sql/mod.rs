// crates/celldb-core/src/sql/mod.rs
// ============================================================================
// Module: CellDB SQL Layer
// Description: Structured statements and dialect rendering.
// Purpose: Replace string-built SQL with typed intent plus a single quoting layer.
// Dependencies: crate::sql::{dialect, statement}
// ============================================================================

//! ## Overview
//! Statements are built as [`Statement`] values and rendered per backend by a
//! [`Dialect`]. Nothing outside this module formats SQL text.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dialect;
pub mod statement;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dialect::Dialect;
pub use dialect::PhoenixDialect;
pub use dialect::RenderedStatement;
pub use dialect::placeholders;
pub use dialect::render_projection;
pub use statement::CATALOG_TABLE;
pub use statement::FEATURE_KEY_COLUMN;
pub use statement::FEATURE_NAME_COLUMN;
pub use statement::FeatureCell;
pub use statement::Projection;
pub use statement::ROW_STORE_TABLE;
pub use statement::Relation;
pub use statement::SAMPLE_KEY_COLUMN;
pub use statement::SqlValue;
pub use statement::Statement;
