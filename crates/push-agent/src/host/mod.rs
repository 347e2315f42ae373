//! Host platform abstraction (notification tray and window clients).

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HostError;
use crate::events::{NotificationOptions, NotificationRecord};

/// A window or tab the host can focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: Uuid,
    pub url: String,
    pub focused: bool,
    /// Whether this agent already controls the client.
    pub controlled: bool,
}

/// Filter for [`NotificationHost::match_all_clients`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientQuery {
    /// Also return clients this agent does not control yet.
    pub include_uncontrolled: bool,
}

/// Trait for the platform hosting the agent.
#[async_trait]
pub trait NotificationHost: Send + Sync {
    /// Get the name of this host.
    fn name(&self) -> &'static str;

    /// Display a notification and return the live record.
    async fn show_notification(
        &self,
        title: &str,
        options: NotificationOptions,
    ) -> Result<NotificationRecord, HostError>;

    /// Close a notification. Closing one that is already gone is not an error.
    async fn close_notification(&self, id: Uuid) -> Result<(), HostError>;

    /// Window clients in host order.
    async fn match_all_clients(&self, query: ClientQuery) -> Result<Vec<WindowClient>, HostError>;

    /// Bring a client to the foreground.
    async fn focus_client(&self, id: Uuid) -> Result<(), HostError>;

    /// Whether [`NotificationHost::open_window`] is available.
    fn can_open_windows(&self) -> bool;

    /// Open `url` in a new window.
    async fn open_window(&self, url: &str) -> Result<WindowClient, HostError>;
}
