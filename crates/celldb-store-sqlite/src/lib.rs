// crates/celldb-store-sqlite/src/lib.rs
// ============================================================================
// Module: CellDB SQLite Store
// Description: StatementExecutor backend using SQLite.
// Purpose: Provide a durable local backend for the CellDB core.
// Dependencies: celldb-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteExecutor`], a SQLite-backed
//! [`StatementExecutor`](celldb_core::StatementExecutor), and the
//! [`SqliteDialect`] it renders statements with. The wide row store and
//! catalog live in ordinary tables; feature columns are added with
//! `ALTER TABLE ... ADD COLUMN` as features appear. Feature columns hold
//! decimals as exact text, and `SQLite` limits a row store to 1999 feature
//! columns.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dialect;
pub mod executor;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dialect::FEATURE_COLUMN_TYPE;
pub use dialect::MAX_BOUND_PARAMS;
pub use dialect::SqliteDialect;
pub use dialect::quote_identifier;
pub use executor::DEFAULT_BUSY_TIMEOUT_MS;
pub use executor::SqliteExecutor;
pub use executor::SqliteExecutorConfig;
pub use executor::SqliteExecutorError;
pub use executor::SqliteStoreMode;
pub use executor::SqliteSyncMode;
