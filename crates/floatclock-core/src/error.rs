//! Core error types for floatclock-core.
//!
//! The timer engines themselves never fail: every command is total and bad
//! input is normalized. Errors only exist at the persistence boundary, and the
//! settings gateway swallows them so a broken store never blocks the timer.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for floatclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read the backing file
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the backing file
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Backing file exists but is not valid TOML
    #[error("Failed to parse settings: {0}")]
    ParseFailed(String),

    /// Key is not part of the settings schema
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    /// Value could not be parsed for the given key
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<toml::de::Error> for StorageError {
    fn from(err: toml::de::Error) -> Self {
        StorageError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
