//! Time-boxed cache over a persistent key/value store.
//!
//! The cache is an optimization only: every failure mode (missing entry,
//! corrupt entry, store fault, expired entry) reads as a miss, and writes are
//! best-effort.

mod store;

pub use store::{CacheError, CacheStore, FileStore, MemoryStore};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Serialized form of a cached value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Write time in epoch milliseconds.
    pub ts: i64,
    pub value: T,
}

/// Key/value cache whose entries expire after a caller-supplied TTL.
///
/// Expired entries are not deleted; they read as absent until the next write
/// for the same key replaces them.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
    namespace: Option<String>,
}

impl TtlCache {
    /// Create a cache over `store` with a flat key space.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            namespace: None,
        }
    }

    /// Create a cache backed by a [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Return a view of the same store whose keys are prefixed with `namespace`.
    #[must_use]
    pub fn namespaced(&self, namespace: impl Into<String>) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: Some(namespace.into()),
        }
    }

    /// Namespace applied to keys, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn storage_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{key}"),
            None => key.to_string(),
        }
    }

    /// Read the value under `key` if it was written at most `ttl` ago.
    pub async fn read<T>(&self, key: &str, ttl: Duration) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.read_at(key, ttl, Utc::now().timestamp_millis()).await
    }

    /// Same as [`Self::read`], evaluated at `now_ms` epoch milliseconds.
    pub async fn read_at<T>(&self, key: &str, ttl: Duration, now_ms: i64) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let storage_key = self.storage_key(key);

        let raw = match self.store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Cache read failed");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %storage_key, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if is_expired(entry.ts, now_ms, ttl) {
            debug!(key = %storage_key, stored_at = entry.ts, "Cache entry expired");
            return None;
        }

        Some(entry.value)
    }

    /// Store `value` under `key`, stamped with the current time.
    pub async fn write<T>(&self, key: &str, value: &T)
    where
        T: Serialize,
    {
        let storage_key = self.storage_key(key);
        let entry = CacheEntry {
            ts: Utc::now().timestamp_millis(),
            value,
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Cache entry not serializable");
                return;
            }
        };

        if let Err(e) = self.store.set(&storage_key, raw).await {
            warn!(key = %storage_key, error = %e, "Cache write failed");
        }
    }
}

/// An entry is stale once strictly more than `ttl` has elapsed since `stored_at`.
fn is_expired(stored_at_ms: i64, now_ms: i64, ttl: Duration) -> bool {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(stored_at_ms) > ttl_ms
}
