// crates/celldb-core/src/runtime/init.rs
// ============================================================================
// Module: CellDB Initialization
// Description: Creation of the row store and catalog relations.
// Purpose: Make startup idempotent against an already-initialized store.
// Dependencies: serde, crate::{interfaces, runtime, sql}
// ============================================================================

//! ## Overview
//! [`initialize`] attempts each relation independently. A failure (typically
//! "table already exists") is recorded in the [`InitReport`] and the audit
//! sink, never returned, so repeated calls are safe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::interfaces::StatementExecutor;
use crate::runtime::audit::CellDbAuditEvent;
use crate::runtime::audit::CellDbAuditSink;
use crate::sql::Relation;
use crate::sql::Statement;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A relation creation failure that initialization swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressedFailure {
    /// Relation whose creation failed.
    pub relation: Relation,
    /// Backend error message.
    pub error: String,
}

/// Outcome of [`initialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    /// Relations created by this call.
    pub created: Vec<Relation>,
    /// Relations whose creation failed.
    pub suppressed: Vec<SuppressedFailure>,
}

impl InitReport {
    /// Returns true when every relation was created by this call.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.suppressed.is_empty()
    }
}

// ============================================================================
// SECTION: Initialization
// ============================================================================

/// Creates the row store, then the catalog.
pub fn initialize<E: StatementExecutor + ?Sized>(
    executor: &E,
    audit: &dyn CellDbAuditSink,
) -> InitReport {
    let mut report = InitReport::default();
    for relation in [Relation::RowStore, Relation::Catalog] {
        match executor.execute(&Statement::CreateRelation(relation)) {
            Ok(()) => report.created.push(relation),
            Err(err) => {
                let error = err.to_string();
                audit.record(&CellDbAuditEvent::init_failure_suppressed(relation, &error));
                report.suppressed.push(SuppressedFailure {
                    relation,
                    error,
                });
            }
        }
    }
    report
}
