//! Key-value backends for the record store
//!
//! The backend seam is deliberately shaped like browser local storage:
//! string keys, string values, whole-value reads and writes.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::{OrderFlowError, OrderFlowResult};

/// Raw key-value storage.
///
/// `get` returning `None` means the key was never written; decode failures
/// are the record store's concern, not the backend's.
pub trait StorageBackend: Send + Sync {
    /// Reads the raw value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Overwrites the value stored under `key`. Last writer wins; with a
    /// single writer (this crate's concurrency model) that is the caller.
    fn set(&self, key: &str, value: &str) -> OrderFlowResult<()>;
}

/// In-memory backend. The default for tests and for sessions that opt out
/// of persistence.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> OrderFlowResult<()> {
        let mut entries = self.entries.lock().map_err(|_| OrderFlowError::Lock)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File backend: one JSON document per collection under a directory.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens (creating if needed) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> OrderFlowResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| OrderFlowError::StoreWrite {
            collection: dir.display().to_string(),
            reason:     e.to_string(),
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> OrderFlowResult<()> {
        fs::write(self.path_for(key), value).map_err(|e| OrderFlowError::StoreWrite {
            collection: key.to_string(),
            reason:     e.to_string(),
        })
    }
}
