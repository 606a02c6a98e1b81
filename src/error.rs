//! Escriba error types

use std::time::Duration;

/// Escriba error types
#[derive(Debug, thiserror::Error)]
pub enum EscribaError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    // Soft errors
    #[error("empty response from model")]
    EmptyResponse,

    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("no generation provider configured")]
    NoProvider,

    #[error("configuration error: {0}")]
    Configuration(String),

    // Report errors
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl EscribaError {
    /// Whether the failure is worth trying again later.
    ///
    /// The rewriter does not retry on its own; this is for callers that
    /// want to offer the operator a "try again" action.
    pub fn is_transient(&self) -> bool {
        match self {
            EscribaError::Http(_) | EscribaError::RateLimited { .. } | EscribaError::EmptyResponse => {
                true
            }
            EscribaError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-suggested wait before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EscribaError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EscribaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EscribaError::InvalidInput(format!("malformed response: {err}"))
        } else {
            EscribaError::Http(err.to_string())
        }
    }
}

/// Result type alias for Escriba operations
pub type Result<T> = std::result::Result<T, EscribaError>;
