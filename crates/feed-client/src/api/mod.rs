//! Network access for the feed API.

mod client;

pub use client::{ApiClient, RequestOptions};
