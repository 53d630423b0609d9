//! Response handling and transformation.
//!
//! # Responsibilities
//! - Carry internal error detail alongside error responses
//! - Expose that detail to clients only in diagnostic mode
//!
//! # Design Decisions
//! - Detail travels as a response extension, never in the body by default
//! - Diagnostics is a separate layer so production routers never contain it

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Internal error detail attached to error responses.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Copies [`ErrorDetail`] into the JSON error body as `message`.
pub async fn diagnostics_middleware(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, 64 * 1024).await else {
        return parts.status.into_response();
    };

    let mut value: serde_json::Value =
        serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(object) = value.as_object_mut() {
        object.insert("message".to_string(), serde_json::Value::String(detail));
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    let rebuilt = Json(value).into_response();
    let (rebuilt_parts, body) = rebuilt.into_parts();
    if let Some(content_type) = rebuilt_parts.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, body)
}
