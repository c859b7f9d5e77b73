//! Errors for vehicle locator
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Position source {path} is unavailable")]
    SourceUnavailableError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record starting at byte {offset} is truncated in field `{field}`")]
    TruncatedRecordError { offset: u64, field: &'static str },

    #[error("Timestamp {raw} in record starting at byte {offset} is out of range")]
    TimestampOutOfRange { offset: u64, raw: u64 },

    #[error("No position records to search")]
    NoRecordsError,

    #[error("Invalid neighbour count: {0}")]
    InvalidCount(usize),

    #[error("Invalid registration: {0:?}")]
    InvalidRegistration(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
