//! Querysmith Error Types
//!
//! Centralized error handling for dispatch and normalization failures.

use thiserror::Error;

/// Central error type for Querysmith
///
/// The four dispatch-layer failures (`Timeout`, `Transport`, `Http`,
/// `Envelope`) stay distinct so callers can render differentiated
/// messages instead of a generic "request failed".
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("transport error ({code}): {message}")]
    Transport { message: String, code: String },

    #[error("API error {status} {status_text}: {body_preview}")]
    Http {
        status: u16,
        status_text: String,
        body_preview: String,
    },

    #[error("malformed response envelope: {detail}")]
    Envelope { detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Querysmith operations
pub type QueryResult<T> = Result<T, QueryError>;
