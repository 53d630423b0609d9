//! Origin authorization gate.
//!
//! Decides per request whether the caller's origin is echoed back as the
//! allowed CORS origin (with credentials) or left without CORS headers, in
//! which case the browser blocks the response. A wildcard origin is never
//! emitted. Preflight requests end here with `204 No Content`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;

use crate::config::CorsConfig;

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Origin, Authorization";

/// Immutable set of origins allowed to make credentialed cross-origin calls.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    exact: Vec<String>,
    preview: Regex,
    extra: Vec<String>,
    max_age: HeaderValue,
}

impl OriginPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            exact: config.allowed_origins.clone(),
            preview: Regex::new(&config.preview_origin_pattern)?,
            extra: config.extra_origins.clone(),
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// `origin` is non-empty and listed, matches the preview rule, or is in
    /// the deployment supplied list.
    pub fn is_allowed(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }
        self.exact.iter().any(|o| o == origin)
            || self.preview.is_match(origin)
            || self.extra.iter().any(|o| o == origin)
    }

    /// Write the CORS response headers for a request from `origin`.
    pub fn apply(&self, headers: &mut HeaderMap, origin: &str) {
        if self.is_allowed(origin) {
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.insert(
                    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    HeaderValue::from_static("true"),
                );
            }
        } else {
            headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);
            headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
        }

        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

/// Request origin, or `""` when absent or not visible ASCII.
fn request_origin(headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Middleware applying the origin gate and answering preflight requests.
pub async fn cors_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request_origin(request.headers());

    if !origin.is_empty() && !policy.is_allowed(&origin) {
        tracing::debug!(origin = %origin, path = %request.uri().path(), "Origin not allowed");
    }

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        policy.apply(response.headers_mut(), &origin);
        return response;
    }

    let mut response = next.run(request).await;
    policy.apply(response.headers_mut(), &origin);
    response
}
