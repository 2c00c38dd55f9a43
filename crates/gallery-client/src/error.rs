//! Backend response → gallery error mapping.

use gallery_core::Error;

/// Classes of failure the upload API reports through HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Missing or mismatched shared secret.
    Unauthorized,
    /// Target does not exist.
    NotFound,
    /// Target already exists (category title).
    Conflict,
    /// Server-side failure.
    ServerError,
    /// Anything else non-2xx.
    Unknown,
}

impl ApiErrorCode {
    /// Determine the error class from an HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert a failed response into a gallery error. `message` is the
/// server's `error` field, surfaced verbatim.
pub fn to_gallery_error(status: u16, message: &str) -> Error {
    match ApiErrorCode::from_status(status) {
        ApiErrorCode::Unauthorized => Error::Forbidden(message.to_string()),
        ApiErrorCode::NotFound => Error::NotFound(message.to_string()),
        ApiErrorCode::Conflict => Error::Duplicate(message.to_string()),
        ApiErrorCode::ServerError | ApiErrorCode::Unknown => Error::remote(status, message),
    }
}

/// Message used when a transport failure means the server never answered.
pub(crate) fn connectivity_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Connectivity(format!("Upload server timed out: {}", e))
    } else {
        Error::Connectivity(format!("Cannot connect to upload server: {}", e))
    }
}
