// crates/celldb-config/src/lib.rs
// ============================================================================
// Module: CellDB Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for celldb.toml semantics.
// Dependencies: celldb-core, celldb-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `celldb-config` defines the configuration model for CellDB tools: the
//! `SQLite` store, the feature column type, listing page sizes, and the audit
//! sink. Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
