//! Configuration for the client data layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::ApiClient;
use crate::cache::{FileStore, TtlCache};

/// Default API origin.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Default directory for persisted cache entries.
pub const DEFAULT_CACHE_DIR: &str = ".feed-cache";

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Configuration for the API client and cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin that relative request paths resolve against.
    pub api_base_url: String,
    /// Directory holding the persistent cache.
    pub cache_dir: PathBuf,
    /// Prefix applied to every cache key.
    pub cache_namespace: Option<String>,
    /// How long cached responses stay fresh.
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_namespace: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `FEED_API_BASE_URL`: API origin (default: `http://localhost:3000`)
    /// - `FEED_CACHE_DIR`: cache directory (default: `.feed-cache`)
    /// - `FEED_CACHE_NAMESPACE`: key prefix for cache entries (default: none)
    /// - `FEED_CACHE_TTL_SECS`: cache freshness in seconds (default: 60)
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("FEED_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let cache_dir = std::env::var("FEED_CACHE_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from);

        let cache_namespace = std::env::var("FEED_CACHE_NAMESPACE")
            .ok()
            .filter(|ns| !ns.is_empty());

        let cache_ttl = std::env::var("FEED_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(
                Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
                Duration::from_secs,
            );

        Self {
            api_base_url,
            cache_dir,
            cache_namespace,
            cache_ttl,
        }
    }

    /// Build an API client for the configured origin.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base_url` is not an absolute URL.
    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::with_base_url(&self.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api_base_url))
    }

    /// Build the file-backed cache, namespaced when configured.
    #[must_use]
    pub fn cache(&self) -> TtlCache {
        let cache = TtlCache::new(Arc::new(FileStore::new(&self.cache_dir)));
        match &self.cache_namespace {
            Some(ns) => cache.namespaced(ns.clone()),
            None => cache,
        }
    }
}
