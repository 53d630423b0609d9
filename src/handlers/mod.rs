//! Request handlers.
//!
//! # Data Flow
//! ```text
//! forms.rs: parse → validate → insert row (deadline) → enqueue email → 200
//! chat.rs:  parse → bound prompt/history → generate (deadline) → 200 {reply}
//! ```
//!
//! Admission control and the origin gate have already run by the time a
//! handler sees the request.

pub mod chat;
pub mod forms;

use axum::http::Method;

use crate::error::ApiError;

pub use chat::{chat, ChatRequest, SYSTEM_INSTRUCTION};
pub use forms::submit_form;

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed(method: Method) -> ApiError {
    tracing::debug!(method = %method, "Method not allowed");
    ApiError::MethodNotAllowed
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
