//! Error types

use thiserror::Error;

/// Failure talking to a key-value storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached at all (no window, storage disabled)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected the operation (quota exceeded, security error)
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure importing a leaderboard file
///
/// Any of these leaves the stored collection untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Top-level value is not an array
    #[error("Invalid format")]
    InvalidFormat,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Rejected change to a config field
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown config field: {0}")]
    UnknownField(String),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
