//! Timeout enforcement for upstream calls.
//!
//! Every call to a collaborator has a deadline. Expiry is reported as
//! [`UpstreamError::Timeout`] so callers can surface it distinctly (504)
//! instead of folding it into a generic failure.

use std::future::Future;
use std::time::Duration;

use crate::services::UpstreamError;

/// Run `call` with a deadline of `limit`.
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout(limit)),
    }
}
