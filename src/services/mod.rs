//! External collaborators.
//!
//! # Data Flow
//! ```text
//! form handler → database.rs (RowStore, authoritative)
//!              → outbox.rs → email.rs (Notifier, best effort)
//! chat handler → generative.rs (TextGenerator)
//! ```
//!
//! # Design Decisions
//! - Each collaborator is a trait object so deployments and tests swap
//!   implementations without touching handlers
//! - Methods return boxed futures to stay object safe

pub mod database;
pub mod email;
pub mod generative;
pub mod outbox;

use std::time::Duration;

use thiserror::Error;

pub use database::{LogRowStore, RestRowStore, RowStore};
pub use email::{EmailMessage, Notifier, ResendNotifier};
pub use generative::{ChatRole, ChatTurn, GeminiClient, GenerationRequest, TextGenerator};
pub use outbox::{Outbox, OutboxWorker};

/// Failure talking to an upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The call did not finish within its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connection or transport failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// No credentials or endpoint configured for the service.
    #[error("not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured limit.
            Self::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Turn a non-success response into [`UpstreamError::Status`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body: body.chars().take(512).collect(),
    })
}
