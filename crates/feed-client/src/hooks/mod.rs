//! Observable request state bound to a URL or a bearer token.
//!
//! Both hooks follow the same commit discipline: every fetch captures a
//! generation number when it is issued, and its result is applied only if no
//! newer fetch (or unmount) happened in the meantime. In-flight requests are
//! never cancelled; late results are dropped.

mod data;
mod summary;

pub use data::DataHook;
pub use summary::{fetch_summary, SummaryHook};

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// State exposed to consumers of a hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookState<T> {
    pub data: Option<T>,
    pub error: Option<FetchError>,
    pub loading: bool,
}

impl<T> Default for HookState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

impl<T> HookState<T> {
    /// Replace data and error with the outcome of a fetch.
    fn apply(&mut self, result: FetchResult<T>) {
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(error) => {
                self.data = None;
                self.error = Some(error);
            }
        }
        self.loading = false;
    }
}

/// Generation-guarded state cell shared by a hook and its fetch tasks.
struct HookCell<T> {
    generation: AtomicU64,
    state: watch::Sender<HookState<T>>,
}

impl<T> HookCell<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(HookState::default());
        Self {
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Start a fetch: enter loading and return the generation it must match.
    ///
    /// The counter only moves while the state lock is held, so a commit can
    /// never interleave between the bump and the loading flag.
    fn begin(&self) -> u64 {
        let mut issued = 0;
        self.state.send_modify(|state| {
            issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
        });
        issued
    }

    /// Apply `result` if `issued` is still the latest generation.
    fn commit(&self, issued: u64, result: FetchResult<T>) -> bool {
        self.state.send_if_modified(|state| {
            let current = self.generation.load(Ordering::SeqCst);
            if current != issued {
                debug!(issued, current, "Discarding stale response");
                return false;
            }
            state.apply(result);
            true
        })
    }

    /// Drop whatever is in flight and leave loading.
    fn invalidate(&self) {
        self.state.send_if_modified(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            std::mem::replace(&mut state.loading, false)
        });
    }

    /// Drop whatever is in flight and forget data and error.
    fn reset(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = HookState::default();
        });
    }

    fn subscribe(&self) -> watch::Receiver<HookState<T>> {
        self.state.subscribe()
    }
}

impl<T: Clone> HookCell<T> {
    fn snapshot(&self) -> HookState<T> {
        self.state.borrow().clone()
    }
}
