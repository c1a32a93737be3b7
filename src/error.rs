//! Error types for TalkToDB.
//!
//! Defines the main error enum used throughout the relay and its mapping
//! onto HTTP status codes.

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Missing or empty input (no SQL, no prompt, unreadable body).
    #[error("{0}")]
    Validation(String),

    /// Statement kind the gate does not execute.
    #[error("{0}")]
    UnsupportedStatement(String),

    /// Statement rejected by the destructive-keyword filter.
    #[error("{0}")]
    PermissionDenied(String),

    /// Execution failures (connection refused, syntax errors, constraint violations, etc.)
    #[error("{0}")]
    Database(String),

    /// Generation backend errors (unreachable, auth, malformed response, etc.)
    #[error("{0}")]
    Generation(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an unsupported-statement error with the given message.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedStatement(msg.into())
    }

    /// Creates a permission-denied error with the given message.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Creates a database error with the given message.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::UnsupportedStatement(_) => "Unsupported Statement",
            Self::PermissionDenied(_) => "Permission Denied",
            Self::Database(_) => "Database Error",
            Self::Generation(_) => "Generation Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the HTTP status this error is surfaced with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedStatement(_) | Self::Database(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
