//! Aggregate user-summary state, gated on a bearer token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{HookCell, HookState};
use crate::api::ApiClient;
use crate::error::{FetchError, FetchResult};
use crate::models::{UserSummary, SUMMARY_PATH};

/// Fetch the summary document with `token` as bearer credentials.
///
/// Non-2xx responses become [`FetchError::Status`] carrying the status code
/// and the raw body text, so callers can tell 401 from 500.
pub async fn fetch_summary(
    client: &ApiClient,
    path: &str,
    token: &str,
) -> FetchResult<UserSummary> {
    let url = client.resolve(path)?;

    let response = client
        .http()
        .get(url.clone())
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| {
            warn!(url = %url, error = %e, "Summary request failed before a response arrived");
            FetchError::Transport(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, status = %status, "Summary request rejected");
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Exposes `{ data, loading, error }` for the current user's summary plus
/// [`SummaryHook::refresh`].
///
/// Nothing is fetched while the token is empty. Every fetch is a live round
/// trip; there is no cache in front of it.
pub struct SummaryHook {
    inner: Arc<Inner>,
}

struct Inner {
    client: ApiClient,
    path: String,
    token: Mutex<Option<String>>,
    cell: HookCell<UserSummary>,
}

impl Inner {
    fn token(&self) -> MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a fetch for `token`. Call with the token lock held so the
    /// generation is taken for the token that is actually bound.
    fn fetch(self: &Arc<Self>, token: String) -> JoinHandle<()> {
        let issued = self.cell.begin();
        let inner = Arc::clone(self);

        tokio::spawn(async move {
            let result = fetch_summary(&inner.client, &inner.path, &token).await;
            if let Err(e) = &result {
                debug!(error = %e, "Summary fetch failed");
            }
            inner.cell.commit(issued, result);
        })
    }

    fn refresh(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let current = self.token();
        let Some(token) = current.clone() else {
            debug!("No token, summary fetch skipped");
            return None;
        };
        Some(self.fetch(token))
    }
}

impl SummaryHook {
    /// Create a hook for the default summary endpoint.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self::with_path(client, SUMMARY_PATH)
    }

    /// Create a hook for a summary endpoint at `path`.
    #[must_use]
    pub fn with_path(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                path: path.into(),
                token: Mutex::new(None),
                cell: HookCell::new(),
            }),
        }
    }

    /// Set the bearer token, fetching when it changed and is non-empty.
    ///
    /// An empty token clears the credentials, drops any in-flight fetch and
    /// forgets the previous user's data.
    pub fn set_token(&self, token: impl Into<String>) -> Option<JoinHandle<()>> {
        let token = token.into();
        let next = (!token.is_empty()).then_some(token);

        let mut current = self.inner.token();
        if *current == next {
            return None;
        }
        *current = next.clone();

        match next {
            Some(token) => Some(self.inner.fetch(token)),
            None => {
                self.inner.cell.reset();
                None
            }
        }
    }

    /// Whether a non-empty token is set.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.token().is_some()
    }

    /// Re-fetch with the current token. Returns `None` when there is no token.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        self.inner.refresh()
    }

    /// Refresh every `every` until the hook is dropped.
    ///
    /// The first refresh happens one interval from now; use
    /// [`Self::set_token`] or [`Self::refresh`] for the initial load.
    pub fn spawn_polling(&self, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        info!(interval_secs = every.as_secs_f64(), "Summary polling started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!("Summary hook dropped, polling stopped");
                    break;
                };
                if let Some(handle) = inner.refresh() {
                    drop(inner);
                    let _ = handle.await;
                }
            }
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HookState<UserSummary> {
        self.inner.cell.snapshot()
    }

    /// Receiver notified on every committed state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HookState<UserSummary>> {
        self.inner.cell.subscribe()
    }
}

impl Drop for SummaryHook {
    fn drop(&mut self) {
        self.inner.cell.invalidate();
    }
}
