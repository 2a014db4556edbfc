//! Persistent key/value storage for client state
//!
//! Mirrors the browser's `localStorage` shape: string keys, string values,
//! synchronous writes. `FileStorage` keeps everything in one JSON object on
//! disk; `MemoryStorage` lives only as long as the process.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::utils::atomic_write;

/// Storage access errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value store with synchronous writes
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object file, rewritten atomically on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StorageResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current contents for a read-modify-write. A corrupt file is logged and
    /// replaced, so one bad write cannot block every later one.
    fn read_for_write(&self) -> StorageResult<BTreeMap<String, String>> {
        match self.read_all() {
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "replacing corrupt storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(items)?;
        atomic_write(&self.path, &content)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut items = self.read_for_write()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut items = match self.read_all() {
            Ok(items) => items,
            Err(StorageError::Corrupt(_)) => {
                tracing::warn!(path = %self.path.display(), "dropping corrupt storage file");
                return self.write_all(&BTreeMap::new());
            }
            Err(e) => return Err(e),
        };
        if items.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.set_item("apiToken", "abc").unwrap();
        assert_eq!(storage.get_item("apiToken").unwrap().as_deref(), Some("abc"));

        storage.remove_item("apiToken").unwrap();
        assert_eq!(storage.get_item("apiToken").unwrap(), None);
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("storage.json"));
        assert_eq!(storage.get_item("apiToken").unwrap(), None);
    }

    #[test]
    fn test_file_storage_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("storage.json"));

        storage.set_item("theme", "dark").unwrap();
        storage.set_item("apiToken", "abc").unwrap();
        storage.remove_item("apiToken").unwrap();

        let reopened = FileStorage::new(storage.path());
        assert_eq!(reopened.get_item("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get_item("apiToken").unwrap(), None);
    }

    #[test]
    fn test_file_storage_reports_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get_item("apiToken"), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_file_storage_write_replaces_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "{bad").unwrap();

        let storage = FileStorage::new(&path);
        storage.set_item("apiToken", "tok").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("apiToken").unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn test_file_storage_remove_resets_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "{bad").unwrap();

        let storage = FileStorage::new(&path);
        storage.remove_item("apiToken").unwrap();
        assert_eq!(storage.get_item("apiToken").unwrap(), None);
    }
}
