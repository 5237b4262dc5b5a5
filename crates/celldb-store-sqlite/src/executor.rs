// crates/celldb-store-sqlite/src/executor.rs
// ============================================================================
// Module: SQLite Statement Executor
// Description: StatementExecutor backed by a single SQLite connection.
// Purpose: Run CellDB statements against a durable local database.
// Dependencies: bigdecimal, celldb-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteExecutor`] renders each [`Statement`] through [`SqliteDialect`] and
//! runs the result in one transaction, so a multi-column addition applies
//! fully or not at all. Engine errors are classified by message into the
//! schema-conflict and unknown-column kinds the core acts on. Every connection
//! has the double-quoted string literal fallback disabled, so a quoted
//! unknown feature column is an error rather than a string constant. Database
//! contents are untrusted: fetched values are decoded strictly and blobs are
//! rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bigdecimal::BigDecimal;
use celldb_core::ExecutionError;
use celldb_core::ResultRow;
use celldb_core::SqlValue;
use celldb_core::Statement;
use celldb_core::StatementExecutor;
use celldb_core::sql::Dialect;
use celldb_core::sql::RenderedStatement;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::config::DbConfig;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use thiserror::Error;

use crate::dialect::SqliteDialect;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` executor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteExecutorConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteExecutorConfig {
    /// Creates a configuration with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` executor setup errors.
#[derive(Debug, Error)]
pub enum SqliteExecutorError {
    /// Filesystem error around the database file.
    #[error("sqlite executor io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite executor db error: {0}")]
    Db(String),
    /// Invalid configuration.
    #[error("sqlite executor invalid config: {0}")]
    Invalid(String),
}

impl From<SqliteExecutorError> for ExecutionError {
    fn from(error: SqliteExecutorError) -> Self {
        Self::Backend(error.to_string())
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// `SQLite`-backed statement executor.
#[derive(Clone)]
pub struct SqliteExecutor {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Rendering dialect.
    dialect: SqliteDialect,
}

impl SqliteExecutor {
    /// Opens (creating if needed) the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteExecutorError`] when the path is invalid or the database
    /// cannot be opened.
    pub fn new(config: &SqliteExecutorConfig) -> Result<Self, SqliteExecutorError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        Self::from_connection(connection)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteExecutorError::Db`] when `SQLite` cannot allocate it.
    pub fn in_memory() -> Result<Self, SqliteExecutorError> {
        let connection =
            Connection::open_in_memory().map_err(|err| SqliteExecutorError::Db(err.to_string()))?;
        Self::from_connection(connection)
    }

    /// Wraps an open connection after disabling double-quoted string literals.
    fn from_connection(connection: Connection) -> Result<Self, SqliteExecutorError> {
        disable_quoted_string_literals(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            dialect: SqliteDialect,
        })
    }

    /// Renders and runs a statement in one transaction, collecting rows.
    fn run(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        let rendered = self.dialect.render(statement);
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| ExecutionError::Backend("mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(classify)?;
        let mut rows = Vec::new();
        for part in &rendered {
            rows.extend(run_rendered(&tx, part)?);
        }
        tx.commit().map_err(classify)?;
        drop(guard);
        Ok(rows)
    }
}

impl StatementExecutor for SqliteExecutor {
    fn execute(&self, statement: &Statement) -> Result<(), ExecutionError> {
        self.run(statement).map(|_| ())
    }

    fn fetch_all(&self, statement: &Statement) -> Result<Vec<ResultRow>, ExecutionError> {
        self.run(statement)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs one rendered statement, returning any rows it produces.
fn run_rendered(
    tx: &rusqlite::Transaction<'_>,
    rendered: &RenderedStatement,
) -> Result<Vec<ResultRow>, ExecutionError> {
    let mut stmt = tx.prepare(&rendered.sql).map_err(classify)?;
    let column_count = stmt.column_count();
    let params = rendered.params.iter().map(bind_value);
    let mut rows = stmt.query(params_from_iter(params)).map_err(classify)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(classify)? {
        let mut values = Vec::with_capacity(column_count);
        for index in 0 .. column_count {
            values.push(decode_value(row.get_ref(index).map_err(classify)?)?);
        }
        out.push(values);
    }
    Ok(out)
}

/// Converts a bound value. Decimals are bound as plain text and stored as such
/// in `TEXT` feature columns.
fn bind_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Text(text) => Value::Text(text.clone()),
        SqlValue::Decimal(decimal) => Value::Text(decimal.to_plain_string()),
    }
}

/// Decodes a fetched column.
fn decode_value(value: ValueRef<'_>) -> Result<SqlValue, ExecutionError> {
    match value {
        ValueRef::Null => Ok(SqlValue::Null),
        ValueRef::Integer(number) => Ok(SqlValue::Decimal(BigDecimal::from(number))),
        ValueRef::Real(number) => BigDecimal::from_str(&number.to_string())
            .map(SqlValue::Decimal)
            .map_err(|err| ExecutionError::Backend(format!("unreadable real value: {err}"))),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(SqlValue::Text)
            .map_err(|_| ExecutionError::Backend("stored text is not valid utf-8".to_string())),
        ValueRef::Blob(_) => Err(ExecutionError::Backend("unexpected blob value".to_string())),
    }
}

/// Maps engine errors to execution error kinds.
fn classify(err: rusqlite::Error) -> ExecutionError {
    let message = err.to_string();
    if message.contains("duplicate column name") {
        ExecutionError::SchemaConflict(message)
    } else if message.contains("no such column") || message.contains("has no column named") {
        ExecutionError::UnknownColumn(message)
    } else {
        ExecutionError::Backend(message)
    }
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteExecutorError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteExecutorError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteExecutorError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteExecutorError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteExecutorError::Invalid("store path must not be empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteExecutorError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteExecutorError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteExecutorError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteExecutorConfig) -> Result<Connection, SqliteExecutorError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteExecutorError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Makes `"name"` always resolve as an identifier in DML and DDL.
fn disable_quoted_string_literals(connection: &Connection) -> Result<(), SqliteExecutorError> {
    for option in [DbConfig::SQLITE_DBCONFIG_DQS_DML, DbConfig::SQLITE_DBCONFIG_DQS_DDL] {
        connection
            .set_db_config(option, false)
            .map_err(|err| SqliteExecutorError::Db(err.to_string()))?;
    }
    Ok(())
}

/// Applies journal, sync, and busy-timeout settings.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteExecutorConfig,
) -> Result<(), SqliteExecutorError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteExecutorError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteExecutorError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteExecutorError::Db(err.to_string()))?;
    Ok(())
}
