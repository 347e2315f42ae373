//! Keep-alive scope for the asynchronous work of one event.

use std::future::Future;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::debug;

/// Work an event handler registered before returning.
///
/// A handler calls [`Lifetime::wait_until`] for each piece of asynchronous
/// work; the agent treats the event as finished only once [`Lifetime::settled`]
/// completes, and never shuts down while a lifetime is outstanding.
#[must_use = "a lifetime does nothing unless settled"]
pub struct Lifetime {
    event: &'static str,
    pending: Vec<BoxFuture<'static, ()>>,
}

impl Lifetime {
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            pending: Vec::new(),
        }
    }

    /// Extend the event until `work` completes.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.push(work.boxed());
    }

    /// Number of registered pieces of work.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Event name this lifetime belongs to.
    #[must_use]
    pub const fn event(&self) -> &'static str {
        self.event
    }

    /// Run all registered work to completion.
    pub async fn settled(self) {
        let count = self.pending.len();
        join_all(self.pending).await;
        debug!(event = self.event, count, "Event settled");
    }
}
