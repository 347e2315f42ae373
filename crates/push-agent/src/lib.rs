//! Background agent for push notifications.
//!
//! The agent runs independently of any page. The host platform delivers two
//! kinds of events: a push message arrived, or the user clicked a
//! notification. The agent turns pushes into displayed notifications and
//! routes clicks to an existing window or a new one.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use push_agent::{AgentEvent, InMemoryHost, NotificationDefaults, PushAgent};
//!
//! # async fn run() {
//! let host = Arc::new(InMemoryHost::new());
//! let agent = PushAgent::new(host.clone(), NotificationDefaults::default());
//! let (events, worker) = agent.start();
//!
//! events
//!     .send(AgentEvent::Push {
//!         data: Some(br#"{"title":"Alice followed you","url":"/users/alice"}"#.to_vec()),
//!     })
//!     .await
//!     .ok();
//!
//! // Closing the channel lets the worker drain and exit
//! drop(events);
//! worker.await.ok();
//! # }
//! ```
//!
//! # Configuration
//!
//! See [`config::AgentConfig::from_env`] for the environment variables read by
//! the `push-agent` daemon.
//!
//! # Architecture
//!
//! - [`NotificationHost`] trait abstracts the notification tray and windows
//! - [`InMemoryHost`] is a headless host used by the daemon and tests
//! - [`PushAgent`] dispatches events, each inside its own [`Lifetime`]

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod lifetime;
pub mod server;

pub use error::HostError;
pub use events::{
    AgentEvent, NotificationData, NotificationDefaults, NotificationOptions, NotificationRecord,
    PushPayload,
};
pub use host::memory::InMemoryHost;
pub use host::{ClientQuery, NotificationHost, WindowClient};
pub use lifetime::Lifetime;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Capacity of the agent's event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 100;

/// What a notification click resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An open client already showed the target URL and was focused.
    Focused(Uuid),
    /// A new window was opened at the target URL.
    Opened(Uuid),
    /// No matching client and the host cannot open windows.
    Ignored,
}

/// Event-driven push notification agent.
pub struct PushAgent {
    host: Arc<dyn NotificationHost>,
    defaults: NotificationDefaults,
}

impl PushAgent {
    /// Create an agent driving `host`.
    #[must_use]
    pub fn new(host: Arc<dyn NotificationHost>, defaults: NotificationDefaults) -> Self {
        Self { host, defaults }
    }

    /// Display defaults applied to pushes.
    #[must_use]
    pub fn defaults(&self) -> &NotificationDefaults {
        &self.defaults
    }

    /// Dispatch one event and return the lifetime holding its work.
    pub fn dispatch(&self, event: AgentEvent) -> Lifetime {
        let mut lifetime = Lifetime::new(event.kind());

        match event {
            AgentEvent::Push { data } => self.on_push(&mut lifetime, data.as_deref()),
            AgentEvent::NotificationClick { notification } => {
                self.on_notification_click(&mut lifetime, notification);
            }
        }

        lifetime
    }

    /// Dispatch one event and wait until its work has settled.
    pub async fn handle(&self, event: AgentEvent) {
        self.dispatch(event).settled().await;
    }

    fn on_push(&self, lifetime: &mut Lifetime, data: Option<&[u8]>) {
        let payload = PushPayload::parse(data);
        let (title, options) = self.defaults.resolve(payload);
        let host = Arc::clone(&self.host);

        debug!(title = %title, url = %options.data.url, "Push received");

        lifetime.wait_until(async move {
            if let Err(e) = host.show_notification(&title, options).await {
                error!(host = host.name(), error = %e, "Failed to show notification");
            }
        });
    }

    fn on_notification_click(&self, lifetime: &mut Lifetime, notification: NotificationRecord) {
        let target = self.defaults.target_url(&notification);
        let host = Arc::clone(&self.host);

        debug!(notification_id = %notification.id, url = %target, "Notification clicked");

        lifetime.wait_until(async move {
            if let Err(e) = host.close_notification(notification.id).await {
                warn!(
                    notification_id = %notification.id,
                    error = %e,
                    "Failed to close notification"
                );
            }

            match route_to(host.as_ref(), &target).await {
                Ok(outcome) => debug!(url = %target, ?outcome, "Click routed"),
                Err(e) => error!(url = %target, error = %e, "Failed to route click"),
            }
        });
    }

    /// Spawn the event loop and return its sender and task handle.
    #[must_use]
    pub fn start(self) -> (mpsc::Sender<AgentEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let handle = tokio::spawn(Arc::new(self).run(rx));
        (tx, handle)
    }

    /// Process events until the channel closes, then drain every outstanding
    /// lifetime before returning.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<AgentEvent>) {
        info!(host = self.host.name(), "Push agent started");
        let mut inflight = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let lifetime = self.dispatch(event);
                    debug!(
                        event = lifetime.event(),
                        pending = lifetime.pending(),
                        "Event dispatched"
                    );
                    inflight.spawn(lifetime.settled());
                }
                Some(result) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(e) = result {
                        error!(error = %e, "Event task failed");
                    }
                }
            }
        }

        let outstanding = inflight.len();
        if outstanding > 0 {
            info!(outstanding, "Event channel closed, waiting for in-flight events");
        }
        while let Some(result) = inflight.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Event task failed");
            }
        }

        info!("Push agent stopped");
    }
}

/// Focus the first client showing exactly `target`, otherwise open a new
/// window when the host allows it.
///
/// # Errors
///
/// Returns the first host error encountered.
pub async fn route_to(
    host: &dyn NotificationHost,
    target: &str,
) -> Result<ClickOutcome, HostError> {
    let clients = host
        .match_all_clients(ClientQuery {
            include_uncontrolled: true,
        })
        .await?;

    if let Some(client) = clients.iter().find(|c| c.url == target) {
        host.focus_client(client.id).await?;
        return Ok(ClickOutcome::Focused(client.id));
    }

    if !host.can_open_windows() {
        debug!(url = %target, "Host cannot open windows, click ignored");
        return Ok(ClickOutcome::Ignored);
    }

    let window = host.open_window(target).await?;
    Ok(ClickOutcome::Opened(window.id))
}
