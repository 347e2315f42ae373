//! Event and notification types handled by the push agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Title used when the payload has none.
pub const DEFAULT_TITLE: &str = "New notification";

/// Body used when the payload has none.
pub const DEFAULT_BODY: &str = "You have a new notification.";

/// Icon used when the payload has none.
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";

/// Badge shown on every notification.
pub const DEFAULT_BADGE: &str = "/icons/badge-72x72.png";

/// Routing target when the payload carries no URL.
pub const ROOT_URL: &str = "/";

/// Push message as sent by the server. Untrusted; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PushPayload {
    /// Parse the raw push data.
    ///
    /// Missing data gives an empty payload. Data that is not a JSON object of
    /// the expected shape is logged and also gives an empty payload, so a
    /// notification is still shown.
    #[must_use]
    pub fn parse(data: Option<&[u8]>) -> Self {
        let Some(bytes) = data.filter(|b| !b.is_empty()) else {
            return Self::default();
        };

        match serde_json::from_slice(bytes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "Malformed push payload, using defaults");
                Self::default()
            }
        }
    }
}

/// Routing data attached to a notification at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

/// Everything the host needs to display a notification besides its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: NotificationData,
}

/// A notification currently shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub options: NotificationOptions,
    pub shown_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// URL stored with the notification, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        Some(self.options.data.url.as_str()).filter(|u| !u.is_empty())
    }
}

/// Display defaults applied to incoming payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub root_url: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_BADGE.to_string(),
            root_url: ROOT_URL.to_string(),
        }
    }
}

impl NotificationDefaults {
    /// Resolve a payload into a title and display options.
    ///
    /// Empty strings count as missing. The badge is never taken from the
    /// payload.
    #[must_use]
    pub fn resolve(&self, payload: PushPayload) -> (String, NotificationOptions) {
        let pick = |value: Option<String>, fallback: &str| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        let title = pick(payload.title, &self.title);
        let options = NotificationOptions {
            body: pick(payload.body, &self.body),
            icon: pick(payload.icon, &self.icon),
            badge: self.badge.clone(),
            data: NotificationData {
                url: pick(payload.url, &self.root_url),
            },
        };

        (title, options)
    }

    /// Routing target for a clicked notification.
    #[must_use]
    pub fn target_url(&self, notification: &NotificationRecord) -> String {
        notification
            .url()
            .map_or_else(|| self.root_url.clone(), ToString::to_string)
    }
}

/// Events delivered to the agent by the host.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A push message arrived; `data` is the raw message body, if any.
    Push { data: Option<Vec<u8>> },

    /// The user clicked a notification.
    NotificationClick { notification: NotificationRecord },
}

impl AgentEvent {
    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::NotificationClick { .. } => "notificationclick",
        }
    }
}
