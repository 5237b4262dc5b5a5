// crates/celldb-core/src/runtime/mod.rs
// ============================================================================
// Module: CellDB Runtime
// Description: Catalog, schema evolution, upserts, matrix reads, and listings.
// Purpose: Drive the wide-table schema and data through a statement executor.
// Dependencies: crate::{core, interfaces, sql}
// ============================================================================

//! ## Overview
//! Runtime components borrow a [`StatementExecutor`](crate::interfaces::StatementExecutor)
//! per call and never open connections. Write paths consult the catalog and
//! evolve the schema before touching row data.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod catalog;
pub mod celldb;
pub mod error;
pub mod evolver;
pub mod init;
pub mod listing;
pub mod matrix;
pub mod memory;
mod rows;
pub mod upsert;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::CellDbAuditEvent;
pub use audit::CellDbAuditSink;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use catalog::SchemaCatalog;
pub use celldb::CellDb;
pub use celldb::SchemaConfig;
pub use error::CellDbError;
pub use evolver::EvolutionOutcome;
pub use evolver::SchemaEvolver;
pub use init::InitReport;
pub use init::SuppressedFailure;
pub use init::initialize;
pub use listing::CatalogListing;
pub use matrix::MatrixQueryBuilder;
pub use matrix::build_projection;
pub use memory::InMemoryExecutor;
pub use upsert::UpsertEngine;
pub use upsert::UpsertReport;
