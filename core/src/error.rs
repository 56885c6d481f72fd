//! Error type for the admin API client.
//!
//! # Design
//! Callers only ever show the failure text to an operator, so every variant
//! renders as a single human-readable message. `Status` renders as the
//! backend's own message verbatim; the status code is kept for logging.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered outside 200..=299.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// A request payload could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A successful response body did not decode into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The persisted token store could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
