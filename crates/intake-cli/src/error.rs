use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] intake_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No field values provided")]
    EmptyFields,
    #[error("Invalid field argument '{0}': expected name=value")]
    InvalidFieldArg(String),
    #[error("Unknown field '{0}' (not in the active schema)")]
    UnknownField(String),
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Invalid record ID: {0}")]
    InvalidRecordId(String),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Token cannot be empty")]
    EmptyToken,
    #[error("Configuration error: {0}")]
    Config(String),
}
