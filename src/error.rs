// Error handling module
// Defines the error taxonomy surfaced by the session pipeline

use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while talking to the Partilio backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Login rejected by the backend (400/401)
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Registration rejected because the email is taken (409)
    #[error("email is already registered")]
    EmailAlreadyExists,

    /// Registration rejected with field-level messages (400)
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: HashMap<String, String>,
    },

    /// A 401 that could not be recovered by a token refresh
    #[error("session expired")]
    SessionExpired,

    /// Transport-level failure (timeout, connectivity, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Unclassified non-success response from the backend
    #[error("backend error: {status} - {body}")]
    Backend { status: u16, body: String },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Status code of the backend response behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ApiError>;
