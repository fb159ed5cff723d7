//! Error types for the lookup engine.
//!
//! Configuration problems and resolution mismatches are integration bugs and
//! surface as hard errors. An empty search result is not an error: it is
//! reported through a status row.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the lookup engine.
#[derive(Debug, Error)]
pub enum LookupError {
    // Build-time configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Resolution errors
    #[error(
        "Key arity mismatch for {source_id}: expected {expected} component(s), got {actual}"
    )]
    ResolutionMismatch {
        source_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Record not found in {source_id} for key {key:?}")]
    RecordNotFound { source_id: String, key: Vec<String> },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    // Session errors
    #[error("Row index {index} is out of range ({len} row(s))")]
    InvalidSelection { index: usize, len: usize },

    #[error("Cannot {action} while session is {state}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },

    // Query provider errors
    #[error("Query provider failed for {source_id}: {message}")]
    Provider { source_id: String, message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },
}

/// Result type alias for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        LookupError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for LookupError {
    fn from(err: rusqlite::Error) -> Self {
        LookupError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl LookupError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        LookupError::Configuration {
            message: message.into(),
        }
    }

    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LookupError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True for errors caused by a misconfigured registry rather than by
    /// runtime conditions. Callers should abort instead of retrying.
    pub fn is_integration_bug(&self) -> bool {
        matches!(
            self,
            LookupError::Configuration { .. }
                | LookupError::ResolutionMismatch { .. }
                | LookupError::UnknownSource(_)
        )
    }
}
