//! External collaborators: the long-term memory service and the chat model.
//!
//! Both are reached through `async_trait` objects so the session can run against
//! the real HTTP clients, the disabled fallbacks, or in-process fakes in tests.
//! Nothing in this module is authoritative for local state.

pub mod chat;
pub mod memory;

use thiserror::Error;

/// Errors from a remote collaborator. Callers log and swallow these.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The collaborator is turned off in config or has no credentials.
    #[error("{0} is disabled")]
    Disabled(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Read a credential from the environment variable named in config.
pub(crate) fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Turn a non-success response into [`RemoteError::Status`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}
