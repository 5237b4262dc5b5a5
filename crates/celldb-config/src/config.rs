// crates/celldb-config/src/config.rs
// ============================================================================
// Module: CellDB Configuration
// Description: Configuration loading and validation for CellDB.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: celldb-core, celldb-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional; an empty file yields the defaults. Invalid
//! values fail the whole load rather than being clamped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use celldb_core::CellDbAuditSink;
use celldb_core::DEFAULT_FEATURE_PAGE_LIMIT;
use celldb_core::DEFAULT_SAMPLE_PAGE_LIMIT;
use celldb_core::DecimalType;
use celldb_core::FileAuditSink;
use celldb_core::NoopAuditSink;
use celldb_core::PageRequest;
use celldb_core::SchemaConfig;
use celldb_core::StderrAuditSink;
use celldb_store_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use celldb_store_sqlite::SqliteExecutorConfig;
use celldb_store_sqlite::SqliteStoreMode;
use celldb_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "celldb.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CELLDB_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default database file when `[store]` omits `path`.
pub const DEFAULT_STORE_PATH: &str = "celldb.sqlite";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound on the busy timeout (ms).
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// CellDB configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellDbConfig {
    /// Backing store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Feature column type configuration.
    #[serde(default)]
    pub schema: SchemaSection,
    /// Default listing page sizes.
    #[serde(default)]
    pub listing: ListingConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl CellDbConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// the explicit `path`, then `CELLDB_CONFIG`, then `celldb.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.schema.validate()?;
        self.listing.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the schema settings for a [`celldb_core::CellDb`] handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when precision or scale is out of range.
    pub fn schema_config(&self) -> Result<SchemaConfig, ConfigError> {
        Ok(SchemaConfig {
            column_type: self.schema.column_type()?,
        })
    }
}

/// `[store]` section: the `SQLite` database.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Database file path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Returns the executor configuration for this store.
    #[must_use]
    pub fn executor_config(&self) -> SqliteExecutorConfig {
        SqliteExecutorConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// `[schema]` section: the decimal type of every feature column.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSection {
    /// Total significant digits.
    #[serde(default = "default_precision")]
    pub precision: u8,
    /// Digits after the decimal point.
    #[serde(default = "default_scale")]
    pub scale: u8,
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            scale: default_scale(),
        }
    }
}

impl SchemaSection {
    /// Validates schema configuration.
    fn validate(self) -> Result<(), ConfigError> {
        self.column_type().map(|_| ())
    }

    /// Returns the configured column type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when precision or scale is out of range.
    pub fn column_type(self) -> Result<DecimalType, ConfigError> {
        DecimalType::new(self.precision, self.scale)
            .map_err(|err| ConfigError::Invalid(format!("schema: {err}")))
    }
}

/// `[listing]` section: default page sizes for catalog listings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingConfig {
    /// Feature ids per page.
    #[serde(default = "default_feature_page_limit")]
    pub feature_page_limit: u64,
    /// Sample ids per page.
    #[serde(default = "default_sample_page_limit")]
    pub sample_page_limit: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            feature_page_limit: default_feature_page_limit(),
            sample_page_limit: default_sample_page_limit(),
        }
    }
}

impl ListingConfig {
    /// Validates listing configuration.
    fn validate(self) -> Result<(), ConfigError> {
        if self.feature_page_limit == 0 {
            return Err(ConfigError::Invalid(
                "listing.feature_page_limit must be greater than zero".to_string(),
            ));
        }
        if self.sample_page_limit == 0 {
            return Err(ConfigError::Invalid(
                "listing.sample_page_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Feature page starting at `offset`.
    #[must_use]
    pub const fn feature_page(self, offset: u64) -> PageRequest {
        PageRequest::new(self.feature_page_limit, offset)
    }

    /// Sample page starting at `offset`.
    #[must_use]
    pub const fn sample_page(self, offset: u64) -> PageRequest {
        PageRequest::new(self.sample_page_limit, offset)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path, required for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires audit.path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened, or
    /// [`ConfigError::Invalid`] when the file sink has no path.
    pub fn build_sink(&self) -> Result<Arc<dyn CellDbAuditSink>, ConfigError> {
        match self.sink {
            AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("file audit sink requires audit.path".to_string())
                })?;
                let sink =
                    FileAuditSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default database path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default column precision.
const fn default_precision() -> u8 {
    DecimalType::DEFAULT.precision()
}

/// Default column scale.
const fn default_scale() -> u8 {
    DecimalType::DEFAULT.scale()
}

/// Default features per page.
const fn default_feature_page_limit() -> u64 {
    DEFAULT_FEATURE_PAGE_LIMIT
}

/// Default samples per page.
const fn default_sample_page_limit() -> u64 {
    DEFAULT_SAMPLE_PAGE_LIMIT
}
