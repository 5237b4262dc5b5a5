// crates/celldb-core/src/runtime/audit.rs
// ============================================================================
// Module: CellDB Audit Logging
// Description: Structured audit events for schema and data mutations.
// Purpose: Emit JSON-line diagnostics without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Schema evolution, catalog registration, sample writes, and suppressed
//! failures are reported as [`CellDbAuditEvent`]s to a [`CellDbAuditSink`].
//! Sinks write one JSON object per line; deployments route the stream to their
//! own logging pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::FeatureId;
use crate::sql::Relation;

// ============================================================================
// SECTION: Types
// ============================================================================

/// CellDB audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellDbAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Relation involved, when the event concerns one.
    pub relation: Option<Relation>,
    /// Feature ids involved.
    pub feature_ids: Vec<String>,
    /// Number of rows written, for data events.
    pub rows_written: Option<usize>,
    /// Suppressed failure message, when present.
    pub message: Option<String>,
}

impl CellDbAuditEvent {
    /// Base event with a consistent timestamp.
    fn new(event: &'static str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            relation: None,
            feature_ids: Vec::new(),
            rows_written: None,
            message: None,
        }
    }

    /// Columns were added to the row store.
    #[must_use]
    pub fn schema_evolved(feature_ids: &[FeatureId]) -> Self {
        Self {
            relation: Some(Relation::RowStore),
            feature_ids: feature_ids.iter().map(ToString::to_string).collect(),
            ..Self::new("schema_evolved")
        }
    }

    /// A column addition failed because the column already existed.
    #[must_use]
    pub fn schema_conflict_suppressed(feature_id: &FeatureId, message: &str) -> Self {
        Self {
            relation: Some(Relation::RowStore),
            feature_ids: vec![feature_id.to_string()],
            message: Some(message.to_string()),
            ..Self::new("schema_conflict_suppressed")
        }
    }

    /// Catalog entries were written.
    #[must_use]
    pub fn features_registered(feature_ids: &[FeatureId]) -> Self {
        Self {
            relation: Some(Relation::Catalog),
            feature_ids: feature_ids.iter().map(ToString::to_string).collect(),
            ..Self::new("features_registered")
        }
    }

    /// Sample rows were written.
    #[must_use]
    pub fn samples_upserted(feature_ids: &[FeatureId], rows_written: usize) -> Self {
        Self {
            relation: Some(Relation::RowStore),
            feature_ids: feature_ids.iter().map(ToString::to_string).collect(),
            rows_written: Some(rows_written),
            ..Self::new("samples_upserted")
        }
    }

    /// Relation creation failed during initialization and was suppressed.
    #[must_use]
    pub fn init_failure_suppressed(relation: Relation, message: &str) -> Self {
        Self {
            relation: Some(relation),
            message: Some(message.to_string()),
            ..Self::new("init_failure_suppressed")
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for CellDB events.
pub trait CellDbAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &CellDbAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl CellDbAuditSink for StderrAuditSink {
    fn record(&self, event: &CellDbAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl CellDbAuditSink for FileAuditSink {
    fn record(&self, event: &CellDbAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl CellDbAuditSink for NoopAuditSink {
    fn record(&self, _event: &CellDbAuditEvent) {}
}

/// Audit sink that keeps events in memory, for tests and embedding callers.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<CellDbAuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<CellDbAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl CellDbAuditSink for MemoryAuditSink {
    fn record(&self, event: &CellDbAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
