// crates/celldb-core/src/lib.rs
// ============================================================================
// Module: CellDB Core Library
// Description: Public API surface for the CellDB core.
// Purpose: Expose the data model, statement layer, executor seam, and runtime.
// Dependencies: crate::{core, interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! CellDB stores a sparse sample × feature expression matrix in a wide table:
//! one row per sample, one decimal column per feature, plus a catalog of known
//! features. The core evolves that schema as new features arrive, upserts
//! per-sample vectors under the right columns, and reconstructs arbitrary
//! sub-matrices. It is backend-agnostic: all I/O goes through a
//! [`StatementExecutor`] supplied by the caller.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;
pub mod sql;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ExecutionError;
pub use interfaces::ResultRow;
pub use interfaces::StatementExecutor;
pub use runtime::CatalogListing;
pub use runtime::CellDb;
pub use runtime::CellDbAuditEvent;
pub use runtime::CellDbAuditSink;
pub use runtime::CellDbError;
pub use runtime::EvolutionOutcome;
pub use runtime::FileAuditSink;
pub use runtime::InMemoryExecutor;
pub use runtime::InitReport;
pub use runtime::MatrixQueryBuilder;
pub use runtime::MemoryAuditSink;
pub use runtime::NoopAuditSink;
pub use runtime::SchemaCatalog;
pub use runtime::SchemaConfig;
pub use runtime::SchemaEvolver;
pub use runtime::StderrAuditSink;
pub use runtime::SuppressedFailure;
pub use runtime::UpsertEngine;
pub use runtime::UpsertReport;
pub use runtime::build_projection;
pub use runtime::initialize;
pub use sql::Dialect;
pub use sql::PhoenixDialect;
pub use sql::Relation;
pub use sql::RenderedStatement;
pub use sql::SqlValue;
pub use sql::Statement;
