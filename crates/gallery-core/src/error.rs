//! Error types for the gallery uploader.

use thiserror::Error;

/// Result type alias using the gallery's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gallery operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Backend endpoint or credentials not configured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/transport failure. The message is shown to the user as-is.
    #[error("{0}")]
    Connectivity(String),

    /// Non-2xx response carrying a server-supplied message, shown as-is.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// Invalid local input (bad index, unknown id, empty title)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists (e.g. category title collision)
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Operation not permitted (default category, immutable entry, bad key)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a remote failure with a server message.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Error::Remote {
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connectivity(_) => true,
            Error::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
