// crates/celldb-core/src/core/identifiers.rs
// ============================================================================
// Module: CellDB Identifiers
// Description: Validated identifiers for features (columns) and samples (rows).
// Purpose: Keep column names inside identifier syntax before any statement renders.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`FeatureId`] is rendered verbatim as a column name in the wide row store,
//! so it is validated against a conservative identifier grammar at
//! construction. A [`SampleId`] is only ever bound as a statement parameter and
//! carries lighter validation. Both serialize as plain strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum feature identifier length in characters.
pub const MAX_FEATURE_ID_LENGTH: usize = 128;
/// Maximum sample identifier length in bytes.
pub const MAX_SAMPLE_ID_LENGTH: usize = 255;

/// Keywords that cannot be used as unquoted column names.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN", "CONSTRAINT",
    "CREATE", "DEFAULT", "DELETE", "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FALSE", "FROM",
    "GROUP", "HAVING", "IN", "INDEX", "INSERT", "INTO", "IS", "JOIN", "KEY", "LIKE", "LIMIT",
    "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "PRIMARY", "REFERENCES", "SELECT", "SET",
    "TABLE", "THEN", "TRUE", "UNION", "UNIQUE", "UPDATE", "UPSERT", "VALUES", "VIEW", "WHEN",
    "WHERE",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Feature identifier violates column-name syntax.
    #[error("invalid feature id `{value}`: {reason}")]
    Feature {
        /// Rejected input.
        value: String,
        /// Validation failure reason.
        reason: &'static str,
    },
    /// Sample identifier violates row-key constraints.
    #[error("invalid sample id: {reason}")]
    Sample {
        /// Validation failure reason.
        reason: &'static str,
    },
}

// ============================================================================
// SECTION: Feature Identifier
// ============================================================================

/// Feature identifier, also the name of its column in the row store.
///
/// # Invariants
/// - 1..=[`MAX_FEATURE_ID_LENGTH`] ASCII characters.
/// - Starts with a letter or `_`; continues with letters, digits or `_`.
/// - Not a reserved keyword and not the sample key column name
///   (ASCII case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId(String);

impl FeatureId {
    /// Validates and creates a feature identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Feature`] when the value is not a legal column name.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        match feature_id_violation(&id) {
            None => Ok(Self(id)),
            Some(reason) => Err(IdentifierError::Feature {
                value: id,
                reason,
            }),
        }
    }

    /// Validates a list of raw identifiers, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] for the first invalid entry.
    pub fn parse_all<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Self>, IdentifierError> {
        ids.iter().map(|id| Self::new(id.as_ref())).collect()
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns the first grammar violation for a feature identifier.
fn feature_id_violation(id: &str) -> Option<&'static str> {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return Some("must be non-empty");
    };
    if id.len() > MAX_FEATURE_ID_LENGTH {
        return Some("exceeds maximum length");
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Some("must start with an ASCII letter or underscore");
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Some("may only contain ASCII letters, digits and underscores");
    }
    if id.eq_ignore_ascii_case(crate::sql::SAMPLE_KEY_COLUMN) {
        return Some("collides with the sample key column");
    }
    if RESERVED_WORDS.iter().any(|word| word.eq_ignore_ascii_case(id)) {
        return Some("is a reserved keyword");
    }
    None
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for FeatureId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for FeatureId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureId> for String {
    fn from(value: FeatureId) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Sample Identifier
// ============================================================================

/// Sample identifier, the primary key of the row store.
///
/// # Invariants
/// - Non-empty, at most [`MAX_SAMPLE_ID_LENGTH`] bytes, no control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SampleId(String);

impl SampleId {
    /// Validates and creates a sample identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Sample`] when the value is empty, too long, or
    /// contains control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must be non-empty")
        } else if id.len() > MAX_SAMPLE_ID_LENGTH {
            Some("exceeds maximum length")
        } else if id.chars().any(char::is_control) {
            Some("must not contain control characters")
        } else {
            None
        };
        match reason {
            None => Ok(Self(id)),
            Some(reason) => Err(IdentifierError::Sample {
                reason,
            }),
        }
    }

    /// Validates a list of raw identifiers, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] for the first invalid entry.
    pub fn parse_all<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Self>, IdentifierError> {
        ids.iter().map(|id| Self::new(id.as_ref())).collect()
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SampleId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for SampleId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SampleId> for String {
    fn from(value: SampleId) -> Self {
        value.0
    }
}
