//! URL-bound request state.

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{HookCell, HookState};
use crate::api::ApiClient;

/// Binds a URL to `{ data, error, loading }`.
///
/// Changing the URL issues a new request; a response for an older URL is
/// discarded even if it arrives last. Dropping the hook discards anything in
/// flight.
pub struct DataHook<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    client: ApiClient,
    url: Mutex<Option<String>>,
    cell: HookCell<T>,
}

impl<T> DataHook<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                url: Mutex::new(None),
                cell: HookCell::new(),
            }),
        }
    }

    /// Currently bound URL.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.inner
            .url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bind a new URL and fetch it.
    ///
    /// Returns `None` without fetching when `url` is already bound. The
    /// returned handle resolves once the response has been committed or
    /// discarded.
    pub fn set_url(&self, url: impl Into<String>) -> Option<JoinHandle<()>> {
        let url = url.into();
        let issued = {
            let mut current = self.inner.url.lock().unwrap_or_else(PoisonError::into_inner);
            if current.as_deref() == Some(url.as_str()) {
                return None;
            }
            *current = Some(url.clone());
            // The generation must belong to the URL bound here
            self.inner.cell.begin()
        };

        let inner = Arc::clone(&self.inner);

        Some(tokio::spawn(async move {
            let result = inner.client.get::<T>(&url).await;
            if !inner.cell.commit(issued, result) {
                debug!(url = %url, "Response arrived after the hook moved on");
            }
        }))
    }

    /// Stop accepting results. Called automatically on drop.
    pub fn unmount(&self) {
        self.inner.cell.invalidate();
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HookState<T> {
        self.inner.cell.snapshot()
    }

    /// Receiver notified on every committed state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HookState<T>> {
        self.inner.cell.subscribe()
    }
}

impl<T> Drop for DataHook<T> {
    fn drop(&mut self) {
        self.inner.cell.invalidate();
    }
}
