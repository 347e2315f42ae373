//! Persistence backends for the TTL cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

/// Errors raised by a cache store.
///
/// These never leave [`super::TtlCache`]; they exist so stores can be tested
/// and logged with a useful reason.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem failure
    #[error("Cache I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    /// Entry could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store lock was poisoned by a panicking writer
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),
}

/// Flat key/value persistence for serialized cache entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the raw entry stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store the raw entry under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
}

/// Durable store keeping one JSON file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the entry files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are arbitrary strings, so they are hex-encoded into file names.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key.as_bytes())))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::Io {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;

        let path = self.entry_path(key);
        fs::write(&path, value).await.map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Process-local store, lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache"));

        assert!(store.get("feed:home").await.unwrap().is_none());

        store
            .set("feed:home", r#"{"ts":1,"value":2}"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get("feed:home").await.unwrap().as_deref(),
            Some(r#"{"ts":1,"value":2}"#)
        );
    }

    #[tokio::test]
    async fn test_file_store_keys_with_path_characters() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store
            .set("../users/42?tab=likes", "a".to_string())
            .await
            .unwrap();
        store.set("users/42", "b".to_string()).await.unwrap();

        assert_eq!(
            store.get("../users/42?tab=likes").await.unwrap().as_deref(),
            Some("a")
        );
        assert_eq!(store.get("users/42").await.unwrap().as_deref(), Some("b"));
        // Both entries live directly in the cache directory
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("k", "1".to_string()).await.unwrap();
        store.set("k", "2".to_string()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
    }
}
