//! Error types for contact-archiver
//!
//! Archive triggers (`start`, `poll`, `reset`) are total and never fail. Errors
//! come from reading the artifact too early, from the contact store, and from
//! loading configuration. Every error maps to an HTTP status and a
//! machine-readable code so the embedding web layer can render it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::Phase;

/// Result type alias for contact-archiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for contact-archiver
#[derive(Debug, Error)]
pub enum Error {
    /// Artifact requested before the archive job completed
    #[error("archive not ready: job is {phase}")]
    NotReady {
        /// Phase the job was in when the artifact was requested
        phase: Phase,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "nominal_duration")
        key: Option<String>,
    },

    /// Record failed validation
    #[error("invalid {field}: {message}")]
    Validation {
        /// Field that failed validation (e.g., "email")
        field: String,
        /// Human-readable reason
        message: String,
    },

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error on a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Standard API error response body
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_ready",
///     "message": "archive not ready: job is running",
///     "details": {
///       "phase": "running"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_ready", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 409 Conflict - resource exists but is not in a downloadable state yet
            Error::NotReady { .. } => 409,

            Error::Config { .. } => 400,
            Error::NotFound(_) => 404,
            Error::Validation { .. } => 422,

            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::NotReady { .. } => "not_ready",
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotReady { phase } => Some(serde_json::json!({ "phase": phase })),
            Error::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
