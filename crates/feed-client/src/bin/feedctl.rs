//! feedctl - command-line access to the feed API through the client data layer.
//!
//! # Environment Variables
//!
//! - `FEED_API_BASE_URL` - API origin (default: `http://localhost:3000`)
//! - `FEED_CACHE_DIR` - persistent cache directory (default: `.feed-cache`)
//! - `FEED_CACHE_NAMESPACE` - cache key prefix
//! - `FEED_CACHE_TTL_SECS` - cache freshness (default: 60)
//! - `FEED_TOKEN` - bearer token for `summary`
//!
//! # Examples
//!
//! ```bash
//! # Fetch a URL, answering from the cache when fresh
//! feedctl get /api/posts?page=1
//!
//! # Bypass the cache
//! feedctl get /api/posts?page=1 --no-cache
//!
//! # Fetch the current user's summary
//! FEED_TOKEN=... feedctl summary
//!
//! # Re-fetch the summary every 30 seconds
//! feedctl summary --token ... --watch 30
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use feed_client::{ClientConfig, FetchError, HookState, SummaryHook, UserSummary};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "feedctl")]
#[command(about = "Query the feed API with caching and summary polling")]
#[command(version)]
struct Cli {
    /// API origin (or set `FEED_API_BASE_URL` env var)
    #[arg(long, env = "FEED_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL and print the JSON response
    Get {
        /// Absolute URL or path relative to the API origin
        url: String,

        /// Cache freshness in seconds (defaults to `FEED_CACHE_TTL_SECS`)
        #[arg(long)]
        ttl: Option<u64>,

        /// Skip the cache for both read and write
        #[arg(long)]
        no_cache: bool,
    },

    /// Fetch the current user's activity summary
    Summary {
        /// Bearer token (or set `FEED_TOKEN` env var)
        #[arg(long, env = "FEED_TOKEN", hide_env_values = true, default_value = "")]
        token: String,

        /// Keep running and re-fetch every N seconds
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }

    match cli.command {
        Commands::Get { url, ttl, no_cache } => get(&config, &url, ttl, no_cache).await,
        Commands::Summary { token, watch } => summary(&config, &token, watch).await,
    }
}

async fn get(
    config: &ClientConfig,
    url: &str,
    ttl: Option<u64>,
    no_cache: bool,
) -> Result<ExitCode> {
    let client = config.api_client()?;
    let cache = config.cache();
    let ttl = ttl.map_or(config.cache_ttl, Duration::from_secs);

    if !no_cache {
        if let Some(value) = cache.read::<serde_json::Value>(url, ttl).await {
            debug!(url = %url, "Cache hit");
            print_json(&value)?;
            return Ok(ExitCode::SUCCESS);
        }
    }

    match client.get::<serde_json::Value>(url).await {
        Ok(value) => {
            if !no_cache {
                cache.write(url, &value).await;
            }
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report(&e)),
    }
}

async fn summary(config: &ClientConfig, token: &str, watch: Option<u64>) -> Result<ExitCode> {
    if token.is_empty() {
        eprintln!("{} no token given (use --token or FEED_TOKEN)", "✗".red());
        return Ok(ExitCode::from(2));
    }

    let hook = SummaryHook::new(config.api_client()?);
    let mut updates = hook.subscribe();

    if let Some(handle) = hook.set_token(token) {
        handle.await.context("Summary fetch task failed")?;
    }

    let state = hook.state();
    let Some(secs) = watch else {
        return print_summary(&state);
    };

    let _poller = hook.spawn_polling(Duration::from_secs(secs));
    info!(interval_secs = secs, "Watching summary");
    updates.mark_unchanged();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if !state.loading {
                    let _ = print_summary(&state)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(state: &HookState<UserSummary>) -> Result<ExitCode> {
    if let Some(error) = &state.error {
        return Ok(report(error));
    }

    if let Some(summary) = &state.data {
        println!(
            "{} {} | {} followers | {} following | {} likes | {} saves | {} mentions",
            "✓".green(),
            summary.me.username.bold(),
            summary.followers.len(),
            summary.following.len(),
            summary.likes.posts.len(),
            summary.saves.posts.len(),
            summary.mentions.len(),
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format response")?;
    println!("{text}");
    Ok(())
}

fn report(error: &FetchError) -> ExitCode {
    eprintln!("{} {error}", "✗".red());
    if error.is_unauthorized() {
        eprintln!("  {}", "check the bearer token".yellow());
    }
    ExitCode::FAILURE
}
