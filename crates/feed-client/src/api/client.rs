//! Single-request HTTP wrapper that normalizes every response shape into a
//! [`FetchResult`].

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method (GET by default)
    pub method: Method,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Sent as `Authorization: Bearer <token>`
    pub bearer_token: Option<String>,
    /// JSON request body
    pub json: Option<serde_json::Value>,
}

impl RequestOptions {
    /// Options for a plain GET.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// Options for a POST with a JSON body.
    #[must_use]
    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            json: Some(body),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// HTTP client for the feed API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    client: Client,
    base_url: Option<Url>,
}

impl ApiClient {
    /// Create a client that only accepts absolute URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client resolving relative URLs against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: Client::new(),
            base_url: Some(Url::parse(base_url)?),
        })
    }

    /// Replace the underlying `reqwest` client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Resolve `url` against the base URL. Failures are transport errors since
    /// no request can be sent.
    pub(crate) fn resolve(&self, url: &str) -> FetchResult<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .as_ref()
                .ok_or_else(|| FetchError::Transport(format!("relative URL without base: {url}")))?
                .join(url)
                .map_err(|e| FetchError::Transport(format!("invalid URL {url}: {e}"))),
            Err(e) => Err(FetchError::Transport(format!("invalid URL {url}: {e}"))),
        }
    }

    /// Perform one request and classify the response.
    ///
    /// - transport failure: [`FetchError::Transport`]
    /// - 429: [`FetchError::RateLimited`], body drained and dropped
    /// - JSON content type: decoded `T` (or [`FetchError::Decode`])
    /// - anything else: the text body as [`FetchError::Upstream`], or
    ///   [`FetchError::UnexpectedResponse`] when empty
    pub async fn request<T>(&self, url: &str, options: RequestOptions) -> FetchResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.resolve(url)?;
        debug!(url = %url, method = %options.method, "Sending request");

        let mut builder = self.client.request(options.method, url.clone());
        for (name, value) in &options.headers {
            builder = builder.header(name, value);
        }
        if let Some(token) = &options.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &options.json {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Request failed before a response arrived");
                return Err(FetchError::Transport(e.to_string()));
            }
        };

        classify(response).await
    }

    /// GET `url` with default options.
    pub async fn get<T>(&self, url: &str) -> FetchResult<T>
    where
        T: DeserializeOwned,
    {
        self.request(url, RequestOptions::get()).await
    }
}

async fn classify<T>(response: Response) -> FetchResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let url = response.url().clone();

    if status == StatusCode::TOO_MANY_REQUESTS {
        // Drain so the connection goes back to the pool; the content is never shown.
        let _ = response.bytes().await;
        warn!(url = %url, "Rate limited by server");
        return Err(FetchError::RateLimited);
    }

    if is_json(&response) {
        let body = response.bytes().await?;
        return serde_json::from_slice(&body).map_err(|e| {
            warn!(url = %url, status = %status, error = %e, "Malformed JSON response");
            FetchError::Decode(e.to_string())
        });
    }

    let text = response.text().await?;
    debug!(url = %url, status = %status, len = text.len(), "Non-JSON response");
    if text.is_empty() {
        Err(FetchError::UnexpectedResponse)
    } else {
        Err(FetchError::Upstream(text))
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}
