//! Error types for the directory API

use std::io;

use thiserror::Error;

use crate::store::StoreError;
use crate::validate::FieldError;

/// Result type alias for the directory API
pub type Result<T> = std::result::Result<T, Error>;

/// Directory API errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input (400)
    #[error("{message}")]
    Invalid {
        /// Human-readable summary
        message: String,
        /// Per-field detail, empty when the failure is not field-shaped
        fields: Vec<FieldError>,
    },

    /// Missing, invalid or revoked credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Unmatched route (404)
    #[error("Not found")]
    NotFound,

    /// Unsupported method on a known route (405)
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Persistence failure (500), message passed through from the store
    #[error("Error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a 400 error with no per-field detail
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Create a 400 error carrying field-level validation errors
    pub fn invalid_fields(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::Invalid {
            message: message.into(),
            fields,
        }
    }

    /// Create a 401 error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}
