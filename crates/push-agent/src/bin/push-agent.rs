//! push-agent - long-running push notification agent with an HTTP surface.
//!
//! # Environment Variables
//!
//! - `PUSH_AGENT_ADDR` - listen address (default: `127.0.0.1:8787`)
//! - `PUSH_DEFAULT_TITLE`, `PUSH_DEFAULT_BODY`, `PUSH_DEFAULT_ICON`, `PUSH_BADGE` -
//!   notification display defaults
//! - `PUSH_ROOT_URL` - click target when a push has no URL (default: `/`)
//! - `PUSH_WINDOW_OPEN` - "false" disables opening new windows
//! - `LOG_FORMAT` - `text` (default) or `json`
//! - `RUST_LOG` - log filter (default: `info`)
//!
//! # Examples
//!
//! ```bash
//! push-agent --listen 0.0.0.0:8787
//!
//! curl -X POST localhost:8787/push -d '{"title":"Alice followed you","url":"/users/alice"}'
//! curl localhost:8787/notifications
//! curl -X POST localhost:8787/notifications/<id>/click
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use push_agent::config::AgentConfig;
use push_agent::server::{self, AppState};
use push_agent::{InMemoryHost, PushAgent};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Push notification agent.
#[derive(Parser)]
#[command(name = "push-agent")]
#[command(about = "Background agent for push notifications and click routing")]
#[command(version)]
struct Cli {
    /// Listen address (overrides `PUSH_AGENT_ADDR`)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = AgentConfig::from_env()?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }

    info!(
        listen_addr = %config.listen_addr,
        window_open = config.window_open,
        root_url = %config.defaults.root_url,
        "Push agent configured"
    );

    let host = Arc::new(InMemoryHost::new().with_window_opening(config.window_open));
    let agent = PushAgent::new(host.clone(), config.defaults);
    let (events, worker) = agent.start();

    let app = server::router(AppState { events, host });
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    info!(addr = %config.listen_addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The router and its event sender are gone; the agent drains and exits.
    worker.await.context("Push agent task failed")?;
    Ok(())
}
