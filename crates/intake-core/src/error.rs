//! Error types for intake-core

use thiserror::Error;

/// Result type alias using intake-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in intake-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Store used before `initialize()` completed
    #[error("Record store is not initialized. Call initialize() first.")]
    NotInitialized,

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service returned a non-2xx response
    #[error("Remote service error: {message} ({status})")]
    Remote { status: u16, message: String },

    /// Authenticated call attempted with no stored credential
    #[error("No credential available for authenticated call")]
    MissingCredential,

    /// Submission rejected: required fields are missing
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
