//! Configuration for the push agent daemon.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::debug;

use crate::events::NotificationDefaults;

/// Default listen address for the daemon.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Address the HTTP surface binds to.
    pub listen_addr: SocketAddr,
    /// Display defaults for incoming pushes.
    pub defaults: NotificationDefaults,
    /// Whether the host may open new windows on click.
    pub window_open: bool,
}

impl AgentConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `PUSH_AGENT_ADDR`: listen address (default: `127.0.0.1:8787`)
    /// - `PUSH_DEFAULT_TITLE`: title when the payload has none
    /// - `PUSH_DEFAULT_BODY`: body when the payload has none
    /// - `PUSH_DEFAULT_ICON`: icon when the payload has none
    /// - `PUSH_BADGE`: badge shown on every notification
    /// - `PUSH_ROOT_URL`: routing target when the payload has no URL (default: `/`)
    /// - `PUSH_WINDOW_OPEN`: set to "false" or "0" to disable opening windows
    ///
    /// # Errors
    ///
    /// Returns an error if `PUSH_AGENT_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("PUSH_AGENT_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .context("PUSH_AGENT_ADDR is not a valid socket address")?;

        let fallback = NotificationDefaults::default();
        let defaults = NotificationDefaults {
            title: env_or("PUSH_DEFAULT_TITLE", fallback.title),
            body: env_or("PUSH_DEFAULT_BODY", fallback.body),
            icon: env_or("PUSH_DEFAULT_ICON", fallback.icon),
            badge: env_or("PUSH_BADGE", fallback.badge),
            root_url: env_or("PUSH_ROOT_URL", fallback.root_url),
        };

        let window_open = std::env::var("PUSH_WINDOW_OPEN")
            .map(|v| !(v.eq_ignore_ascii_case("false") || v == "0"))
            .unwrap_or(true);

        debug!(listen_addr = %listen_addr, window_open, "Loaded agent configuration");

        Ok(Self {
            listen_addr,
            defaults,
            window_open,
        })
    }
}

fn env_or(var: &str, fallback: String) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DEFAULT_BADGE, DEFAULT_TITLE};
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "PUSH_AGENT_ADDR",
        "PUSH_DEFAULT_TITLE",
        "PUSH_DEFAULT_BODY",
        "PUSH_DEFAULT_ICON",
        "PUSH_BADGE",
        "PUSH_ROOT_URL",
        "PUSH_WINDOW_OPEN",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR.parse().unwrap());
        assert_eq!(config.defaults, NotificationDefaults::default());
        assert!(config.window_open);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("PUSH_AGENT_ADDR", "0.0.0.0:9000");
        std::env::set_var("PUSH_DEFAULT_TITLE", "Feed");
        std::env::set_var("PUSH_ROOT_URL", "/home");
        std::env::set_var("PUSH_DEFAULT_ICON", "");
        std::env::set_var("PUSH_WINDOW_OPEN", "FALSE");

        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.defaults.title, "Feed");
        assert_ne!(config.defaults.title, DEFAULT_TITLE);
        assert_eq!(config.defaults.root_url, "/home");
        assert_eq!(config.defaults.icon, NotificationDefaults::default().icon);
        assert_eq!(config.defaults.badge, DEFAULT_BADGE);
        assert!(!config.window_open);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_addr() {
        clear_env();
        std::env::set_var("PUSH_AGENT_ADDR", "not-an-address");
        assert!(AgentConfig::from_env().is_err());
        clear_env();
    }
}
