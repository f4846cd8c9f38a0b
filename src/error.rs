//! Error types for the Mechanical Department backend.

use thiserror::Error;

/// Common error type for the backend.
#[derive(Error, Debug)]
pub enum MechError {
    /// Database error.
    ///
    /// Wraps errors from the SQL backend. Errors from sqlx are converted
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Upstream chat API error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for MechError {
    fn from(e: sqlx::Error) -> Self {
        MechError::Database(e.to_string())
    }
}

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, MechError>;
