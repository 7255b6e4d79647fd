//! Identifier lookup errors.

use thiserror::Error;

/// Failures tied to a specific identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The store has no record for `id`.
    #[error("Record '{id}' not found")]
    NotFound { id: String },

    /// A composite identifier had the wrong number of `:`-separated fields.
    #[error("Malformed identifier '{id}': expected {expected} fields, got {actual}")]
    MalformedId {
        id: String,
        expected: usize,
        actual: usize,
    },
}

impl LookupError {
    /// The identifier this error refers to.
    pub fn id(&self) -> &str {
        match self {
            LookupError::NotFound { id } | LookupError::MalformedId { id, .. } => id,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            LookupError::NotFound { .. } => "E_LOOKUP_NOT_FOUND",
            LookupError::MalformedId { .. } => "E_LOOKUP_MALFORMED",
        }
    }
}
