//! Error handling for the grievance platform core

use std::fmt;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Unified error type for the platform core
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Field-level validation failures, keyed by form field name.
    /// Returned to the submitter, never treated as a fault.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// The evidence image could not be stored; the submission is aborted
    #[error("image upload failed: {0}")]
    ImageUploadFailed(String),

    /// Data store unavailable or a write was rejected
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A status value outside the triage state machine
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Missing or broken operational state (absent credential record,
    /// missing environment variables). Distinct from user error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad credentials. Deliberately generic and non-revealing.
    #[error("authentication error: {0}")]
    Auth(String),
}

impl Error {
    /// Create a new image upload error
    pub fn upload<T: fmt::Display>(msg: T) -> Self {
        Error::ImageUploadFailed(msg.to_string())
    }

    /// Create a new persistence error
    pub fn persistence<T: fmt::Display>(msg: T) -> Self {
        Error::Persistence(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new configuration error
    pub fn configuration<T: fmt::Display>(msg: T) -> Self {
        Error::Configuration(msg.to_string())
    }

    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }
}
