//! Error types for rivalwatch.

use thiserror::Error;

/// Common error type for rivalwatch.
#[derive(Error, Debug)]
pub enum RivalError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Outbound HTTP fetch error (pages, feeds, APIs).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Feed parsing error.
    #[error("feed error: {0}")]
    Feed(String),

    /// LLM provider error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Notification delivery error.
    #[error("notification error: {0}")]
    Notify(String),

    /// Report export error.
    #[error("export error: {0}")]
    Export(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for RivalError {
    fn from(e: sqlx::Error) -> Self {
        RivalError::Database(e.to_string())
    }
}

/// Result type alias for rivalwatch operations.
pub type Result<T> = std::result::Result<T, RivalError>;
