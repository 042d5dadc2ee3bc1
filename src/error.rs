//! Error types for the crawlterm crate

use thiserror::Error;

/// Result type for crawlterm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for crawlterm operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, timeout, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-2xx status
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message extracted from the body, or the raw body
        message: String,
    },

    /// Response body did not have a recognised shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid request parameters, rejected before anything is sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Filesystem or terminal I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status code, when the failure came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the request never reached the server
    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_connect())
    }

    /// Whether the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }
}
