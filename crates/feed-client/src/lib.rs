//! Client data layer for the feed.
//!
//! This crate feeds the UI with data from the feed API and tolerates partial
//! failures of that API: every network-backed operation returns a
//! [`FetchResult`] instead of panicking or bubbling transport errors.
//!
//! # Usage
//!
//! ```no_run
//! use feed_client::{ApiClient, DataHook, SummaryHook};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = ApiClient::with_base_url("https://feed.example.com")?;
//!
//! // Bind a URL to observable state
//! let posts: DataHook<serde_json::Value> = DataHook::new(client.clone());
//! if let Some(handle) = posts.set_url("/api/posts?page=1") {
//!     handle.await?;
//! }
//! println!("{:?}", posts.state());
//!
//! // Fetch the current user's summary once a token is known
//! let summary = SummaryHook::new(client);
//! if let Some(handle) = summary.set_token("eyJhbGciOi...") {
//!     handle.await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`TtlCache`] is an optional side channel with expiring entries over a
//!   [`CacheStore`]
//! - [`ApiClient`] classifies responses (JSON, text, rate limited)
//! - [`DataHook`] and [`SummaryHook`] expose `{ data, error, loading }` and
//!   discard stale responses

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod models;

pub use api::{ApiClient, RequestOptions};
pub use cache::{CacheEntry, CacheError, CacheStore, FileStore, MemoryStore, TtlCache};
pub use config::ClientConfig;
pub use error::{FetchError, FetchResult};
pub use hooks::{fetch_summary, DataHook, HookState, SummaryHook};
pub use models::UserSummary;
