//! TOML-backed settings store.
//!
//! Dotted keys map onto one level of tables, so `pomodoro.work_secs` is
//! written as
//!
//! ```toml
//! [pomodoro]
//! work_secs = 1500
//! ```
//!
//! Writes stay in memory until [`SettingsStore::commit`].

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use super::{data_dir, SettingsStore};
use crate::error::StorageError;

pub const FILE_NAME: &str = "settings.toml";

#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
    table: Table,
    dirty: bool,
}

impl TomlFileStore {
    /// Open `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str::<Table>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Table::new(),
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(Self {
            path,
            table,
            dirty: false,
        })
    }

    /// Open `path`, falling back to an empty store if it is unreadable.
    /// The next commit overwrites the broken file.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings file unreadable, using defaults");
                Self {
                    path,
                    table: Table::new(),
                    dirty: false,
                }
            }
        }
    }

    /// `settings.toml` inside [`data_dir`]. Never fails; an unusable
    /// location surfaces later as a commit error.
    pub fn open_default() -> Self {
        Self::open_or_empty(data_dir().join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        match key.split_once('.') {
            Some((section, leaf)) => self.table.get(section)?.as_table()?.get(leaf),
            None => self.table.get(key),
        }
    }

    fn section_mut(&mut self, key: &str, section: &str) -> Result<&mut Table, StorageError> {
        let entry = self
            .table
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        entry.as_table_mut().ok_or_else(|| StorageError::InvalidValue {
            key: key.to_string(),
            message: format!("'{section}' is not a table"),
        })
    }
}

impl SettingsStore for TomlFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lookup(key).map(value_to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let encoded = encode(value);
        if self.lookup(key) == Some(&encoded) {
            return Ok(());
        }
        match key.split_once('.') {
            Some((section, leaf)) => {
                self.section_mut(key, section)?
                    .insert(leaf.to_string(), encoded);
            }
            None => {
                self.table.insert(key.to_string(), encoded);
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let removed = match key.split_once('.') {
            Some((section, leaf)) => self
                .table
                .get_mut(section)
                .and_then(Value::as_table_mut)
                .and_then(|t| t.remove(leaf)),
            None => self.table.remove(key),
        };
        self.dirty |= removed.is_some();
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        let save_failed = |message: String| StorageError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        let content = toml::to_string_pretty(&self.table).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| save_failed(e.to_string()))?;
        self.dirty = false;
        Ok(())
    }
}

/// Keep numbers and booleans typed in the file.
fn encode(value: &str) -> Value {
    if let Ok(b) = value.parse::<bool>() {
        Value::Boolean(b)
    } else if let Ok(n) = value.parse::<i64>() {
        Value::Integer(n)
    } else {
        Value::String(value.to_string())
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlFileStore::open(dir.path().join(FILE_NAME)).unwrap();
        assert!(store.get("mode").unwrap().is_none());
    }

    #[test]
    fn commit_writes_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);
        let mut store = TomlFileStore::open(&path).unwrap();
        store.set("mode", "countdown").unwrap();
        store.set("pomodoro.work_secs", "1500").unwrap();
        store.set("pomodoro.auto_start", "true").unwrap();
        store.commit().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("mode = \"countdown\""));
        assert!(written.contains("[pomodoro]"));
        assert!(written.contains("work_secs = 1500"));

        let reopened = TomlFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("pomodoro.work_secs").unwrap().as_deref(), Some("1500"));
        assert_eq!(reopened.get("pomodoro.auto_start").unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get("mode").unwrap().as_deref(), Some("countdown"));
    }

    #[test]
    fn nothing_written_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let mut store = TomlFileStore::open(&path).unwrap();
        store.set("sound.enabled", "false").unwrap();
        assert!(!path.exists());
        store.commit().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unchanged_values_do_not_rewrite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let mut store = TomlFileStore::open(&path).unwrap();
        store.set("pomodoro.work_secs", "1500").unwrap();
        store.set("mode", "clock").unwrap();
        store.commit().unwrap();

        std::fs::remove_file(&path).unwrap();
        store.set("pomodoro.work_secs", "1500").unwrap();
        store.set("mode", "clock").unwrap();
        assert!(!store.dirty);
        store.commit().unwrap();
        assert!(!path.exists());

        store.set("mode", "pomodoro").unwrap();
        store.commit().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "this is [not toml").unwrap();
        assert!(matches!(
            TomlFileStore::open(&path),
            Err(StorageError::ParseFailed(_))
        ));
        let store = TomlFileStore::open_or_empty(&path);
        assert!(store.get("mode").unwrap().is_none());
    }

    #[test]
    fn unusable_location_fails_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let mut store = TomlFileStore::open_or_empty(blocker.join("home").join(FILE_NAME));
        assert!(store.get("mode").unwrap().is_none());
        store.set("mode", "countdown").unwrap();
        assert!(matches!(store.commit(), Err(StorageError::SaveFailed { .. })));
    }

    #[test]
    fn remove_drops_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlFileStore::open(dir.path().join(FILE_NAME)).unwrap();
        store.set("clock.show_date", "true").unwrap();
        store.remove("clock.show_date").unwrap();
        assert!(store.get("clock.show_date").unwrap().is_none());
    }
}
