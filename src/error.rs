//! Crate-level error type.
//!
//! Every fallible operation in the client returns [`SstError`]. Views never
//! propagate these past their own boundary: they store `err.to_string()` as
//! the displayable error line and keep polling.

use thiserror::Error;

/// Errors surfaced by the API client, local storage, and configuration.
#[derive(Debug, Error)]
pub enum SstError {
    /// A TCP-level or TLS failure; no HTTP status was received.
    #[error("Connection failed to {url}: {detail}")]
    Transport { url: String, detail: String },

    /// Non-2xx response whose body carried a JSON `{"detail": ...}`.
    /// The detail is shown to the user verbatim.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    /// Non-2xx response without a usable JSON detail.
    #[error("{context} ({status}){}", body_suffix(.body))]
    Status {
        status: u16,
        context: String,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("Unexpected response for {what}: {detail}")]
    Decode { what: String, detail: String },

    /// Local input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Short non-JSON bodies (plain-text error pages) are worth showing; long
/// HTML error pages are not.
fn body_suffix(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.len() > 200 || trimmed.starts_with('<') {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl SstError {
    /// HTTP status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SstError::Api { status, .. } | SstError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SstError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, SstError>;
