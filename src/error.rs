//! API error taxonomy and HTTP status mapping.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::http::response::ErrorDetail;
use crate::services::UpstreamError;

/// Service name used for generative chat failures.
pub const CHAT_SERVICE: &str = "chat";

/// Field name → human readable reason.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Every failure a handler can surface to a client.
///
/// Rejected origins are not represented here: they only lose their CORS
/// headers and the browser blocks the response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("not found")]
    NotFound,

    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after: Duration },

    #[error("{message}")]
    ValidationFailed {
        message: &'static str,
        details: FieldErrors,
    },

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("{service} failed: {detail}")]
    Upstream { service: &'static str, detail: String },

    #[error("{service} timed out")]
    UpstreamTimeout { service: &'static str },

    #[error("{service} is not configured")]
    Unavailable { service: &'static str },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A single-field validation failure.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        let mut details = FieldErrors::new();
        details.insert(field, reason.into());
        Self::ValidationFailed {
            message: "Validation failed",
            details,
        }
    }

    /// Wrap a collaborator failure, keeping timeouts distinct.
    pub fn upstream(service: &'static str, err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout(_) => Self::UpstreamTimeout { service },
            UpstreamError::NotConfigured => Self::Unavailable { service },
            other => Self::Upstream {
                service,
                detail: other.to_string(),
            },
        }
    }

    /// Returns the HTTP status code corresponding to this error variant.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ValidationFailed { .. } | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short client-facing message. Never carries upstream payloads.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "Method not allowed",
            Self::NotFound => "Not found",
            Self::RateLimitExceeded { .. } => "Too many requests. Please try again later.",
            Self::ValidationFailed { message, .. } => *message,
            Self::MalformedBody(_) => "Invalid JSON format",
            Self::PayloadTooLarge => "Request body too large",
            Self::Upstream {
                service: CHAT_SERVICE,
                ..
            }
            | Self::UpstreamTimeout {
                service: CHAT_SERVICE,
            } => "The kitchen is busy 🍲 Please try again shortly.",
            Self::Unavailable {
                service: CHAT_SERVICE,
            } => "Chat is unavailable",
            Self::Upstream { .. } | Self::UpstreamTimeout { .. } => "Upstream service failure",
            Self::Unavailable { .. } => "Service unavailable",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// Detail that only belongs in logs (and diagnostic responses).
    fn internal_detail(&self) -> Option<String> {
        match self {
            Self::MalformedBody(detail) | Self::Internal(detail) => Some(detail.clone()),
            Self::Upstream { .. } | Self::UpstreamTimeout { .. } | Self::Unavailable { .. } => {
                Some(self.to_string())
            }
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::MalformedBody(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.internal_detail();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else if let Some(detail) = &detail {
            tracing::debug!(status = status.as_u16(), detail = %detail, "request rejected");
        }

        let body = match &self {
            Self::ValidationFailed { message, details } => {
                json!({ "error": message, "details": details })
            }
            other => json!({ "error": other.public_message() }),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimitExceeded { retry_after } = &self {
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail(detail));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::RateLimitExceeded {
                retry_after: Duration::from_secs(1)
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::upstream("database", UpstreamError::Timeout(Duration::from_secs(15)))
                .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::upstream(CHAT_SERVICE, UpstreamError::NotConfigured).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_chat_failures_have_friendly_messages() {
        let timeout = ApiError::upstream(CHAT_SERVICE, UpstreamError::Timeout(Duration::from_secs(1)));
        assert_eq!(timeout.public_message(), "The kitchen is busy 🍲 Please try again shortly.");
        assert_eq!(
            ApiError::upstream(CHAT_SERVICE, UpstreamError::NotConfigured).public_message(),
            "Chat is unavailable"
        );
    }

    #[test]
    fn test_upstream_detail_is_not_public() {
        let err = ApiError::upstream(
            "database",
            UpstreamError::Status {
                status: 500,
                body: "secret stack trace".to_string(),
            },
        );
        assert_eq!(err.public_message(), "Upstream service failure");
        assert!(err.internal_detail().unwrap().contains("secret stack trace"));
    }

    #[test]
    fn test_retry_after_is_rounded_up() {
        let response = ApiError::RateLimitExceeded {
            retry_after: Duration::from_millis(1500),
        }
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn test_error_detail_extension() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(
            response.extensions().get::<ErrorDetail>().map(|d| d.0.as_str()),
            Some("boom")
        );
    }
}
