//! String-keyed, string-valued key/value stores.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::error::StoreError;

/// How often the durable store writes dirty pages back to disk.
const FLUSH_EVERY_MS: u64 = 500;

/// A flat key/value store.
///
/// Implementations need not be thread-safe; callers serialize access.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove a key. Returns whether it was present.
    fn remove(&mut self, key: &str) -> Result<bool, StoreError>;

    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process store. Contents are lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Durable store backed by a sled database directory.
///
/// Reads and writes go straight to sled, so there is no second copy that
/// can disagree with what is on disk. Dirty pages are flushed in the
/// background and once more when the store is dropped.
pub struct FileStore {
    path: PathBuf,
    db: sled::Db,
}

impl FileStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let db = sled::Config::new()
            .path(&path)
            .flush_every_ms(Some(FLUSH_EVERY_MS))
            .open()?;

        Ok(Self { path, db })
    }

    /// Get the database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Non-UTF-8 bytes become replacement characters and then fail to
        // parse upstream, which evicts the entry.
        Ok(self
            .db
            .get(key.as_bytes())?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.db.insert(key.as_bytes(), value.into_bytes())?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.db.remove(key.as_bytes())?.is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for key in self.db.iter().keys() {
            if let Ok(key) = String::from_utf8(key?.to_vec()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.db.flush() {
            warn!(path = %self.path.display(), error = %e, "failed to flush cache store");
        }
    }
}
