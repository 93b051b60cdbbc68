//! Error types for linear-bridge.

use thiserror::Error;

/// Main error type for linear-bridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Credentials were rejected (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials lack permission (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Remote entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote rate limit hit (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Remote server failure (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// API rejected the request
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Caller-supplied arguments are missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Error::Unauthorized(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            429 => Error::RateLimited(message),
            500..=599 => Error::ServerError { status, message },
            _ => Error::Api { status, message },
        }
    }

    /// Whether this error means the remote entity is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for linear-bridge operations.
pub type Result<T> = std::result::Result<T, Error>;
