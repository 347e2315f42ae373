//! Headless host keeping its notification tray and window list in memory.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::HostError;
use crate::events::{NotificationOptions, NotificationRecord};
use crate::host::{ClientQuery, NotificationHost, WindowClient};

/// In-memory notification host.
///
/// Notifications stay in the tray until closed. Clients are kept in
/// registration order, which is the order `match_all_clients` returns.
pub struct InMemoryHost {
    tray: RwLock<Vec<NotificationRecord>>,
    clients: RwLock<Vec<WindowClient>>,
    window_opening: bool,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// Create an empty host that can open windows.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tray: RwLock::new(Vec::new()),
            clients: RwLock::new(Vec::new()),
            window_opening: true,
        }
    }

    /// Enable or disable window opening.
    #[must_use]
    pub fn with_window_opening(mut self, enabled: bool) -> Self {
        self.window_opening = enabled;
        self
    }

    /// Register an open window client.
    pub async fn add_client(&self, url: impl Into<String>, controlled: bool) -> WindowClient {
        let client = WindowClient {
            id: Uuid::new_v4(),
            url: url.into(),
            focused: false,
            controlled,
        };
        self.clients.write().await.push(client.clone());
        debug!(client_id = %client.id, url = %client.url, "Client registered");
        client
    }

    /// Notifications currently in the tray, oldest first.
    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.tray.read().await.clone()
    }

    /// Look up a notification in the tray.
    pub async fn notification(&self, id: Uuid) -> Option<NotificationRecord> {
        self.tray.read().await.iter().find(|n| n.id == id).cloned()
    }

    /// All window clients, regardless of control.
    pub async fn clients(&self) -> Vec<WindowClient> {
        self.clients.read().await.clone()
    }

    /// The focused client, if any.
    pub async fn focused_client(&self) -> Option<WindowClient> {
        self.clients.read().await.iter().find(|c| c.focused).cloned()
    }
}

#[async_trait]
impl NotificationHost for InMemoryHost {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn show_notification(
        &self,
        title: &str,
        options: NotificationOptions,
    ) -> Result<NotificationRecord, HostError> {
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            options,
            shown_at: Utc::now(),
        };

        self.tray.write().await.push(record.clone());
        info!(
            notification_id = %record.id,
            title = %record.title,
            url = %record.options.data.url,
            "Notification shown"
        );

        Ok(record)
    }

    async fn close_notification(&self, id: Uuid) -> Result<(), HostError> {
        let mut tray = self.tray.write().await;
        let before = tray.len();
        tray.retain(|n| n.id != id);

        if tray.len() == before {
            debug!(notification_id = %id, "Notification already gone");
        } else {
            debug!(notification_id = %id, "Notification closed");
        }
        Ok(())
    }

    async fn match_all_clients(&self, query: ClientQuery) -> Result<Vec<WindowClient>, HostError> {
        Ok(self
            .clients
            .read()
            .await
            .iter()
            .filter(|c| c.controlled || query.include_uncontrolled)
            .cloned()
            .collect())
    }

    async fn focus_client(&self, id: Uuid) -> Result<(), HostError> {
        let mut clients = self.clients.write().await;
        if !clients.iter().any(|c| c.id == id) {
            return Err(HostError::ClientNotFound(id));
        }

        for client in clients.iter_mut() {
            client.focused = client.id == id;
        }
        info!(client_id = %id, "Client focused");
        Ok(())
    }

    fn can_open_windows(&self) -> bool {
        self.window_opening
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient, HostError> {
        if !self.window_opening {
            return Err(HostError::WindowOpenUnsupported);
        }

        let client = WindowClient {
            id: Uuid::new_v4(),
            url: url.to_string(),
            focused: true,
            controlled: true,
        };

        let mut clients = self.clients.write().await;
        for existing in clients.iter_mut() {
            existing.focused = false;
        }
        clients.push(client.clone());
        info!(client_id = %client.id, url = %url, "Window opened");

        Ok(client)
    }
}
