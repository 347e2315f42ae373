//! Error types for the client data layer.

use thiserror::Error;

/// Message shown when the API answers with HTTP 429.
pub const RATE_LIMITED_MESSAGE: &str = "Server busy, try again later";

/// Message shown when a non-JSON response carries an empty body.
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response";

/// Every failure a network-backed operation can report.
///
/// The `Display` output is the user-facing error string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, refused connection, bad URL).
    #[error("{0}")]
    Transport(String),

    /// The server answered 429. The body is discarded.
    #[error("Server busy, try again later")]
    RateLimited,

    /// Non-JSON response with a text body.
    #[error("{0}")]
    Upstream(String),

    /// Non-JSON response with an empty body.
    #[error("Unexpected response")]
    UnexpectedResponse,

    /// JSON response that could not be decoded into the expected shape.
    #[error("Invalid JSON response: {0}")]
    Decode(String),

    /// Non-2xx response from an endpoint that reports status codes.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl FetchError {
    /// HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(429),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the caller's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result of any network-backed operation: data or error, never both.
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        assert_eq!(FetchError::RateLimited.to_string(), RATE_LIMITED_MESSAGE);
        assert_eq!(
            FetchError::UnexpectedResponse.to_string(),
            UNEXPECTED_RESPONSE_MESSAGE
        );
        assert_eq!(
            FetchError::Status {
                status: 401,
                body: "token expired".to_string()
            }
            .to_string(),
            "HTTP 401: token expired"
        );
        assert_eq!(
            FetchError::Upstream("<h1>Bad Gateway</h1>".to_string()).to_string(),
            "<h1>Bad Gateway</h1>"
        );
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(FetchError::RateLimited.status(), Some(429));
        assert_eq!(FetchError::Transport("reset".to_string()).status(), None);

        let err = FetchError::Status {
            status: 401,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        assert!(!FetchError::Status {
            status: 500,
            body: String::new()
        }
        .is_unauthorized());
    }
}
