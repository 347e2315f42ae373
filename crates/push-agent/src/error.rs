//! Error types for the push agent.

use thiserror::Error;
use uuid::Uuid;

/// Errors a notification host can report.
#[derive(Debug, Error)]
pub enum HostError {
    /// Window client is gone
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Host cannot open new windows
    #[error("Opening windows is not supported by this host")]
    WindowOpenUnsupported,
}
