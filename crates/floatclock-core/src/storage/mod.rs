//! Key/value settings stores.
//!
//! The engine only ever sees [`SettingsStore`]: string keys, string values.
//! How they are kept is the store's business.

mod file;
mod memory;

pub use file::TomlFileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Minimal get/set interface over persisted settings.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Make pending writes durable. Stores that write through need not
    /// override this.
    fn commit(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Returns `$FLOATCLOCK_HOME` if set, else `~/.config/floatclock/`.
///
/// The directory is not created here; [`TomlFileStore`] creates it on the
/// first commit.
pub fn data_dir() -> PathBuf {
    match std::env::var_os("FLOATCLOCK_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("floatclock"),
    }
}
