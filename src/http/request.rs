//! Request handling and transformation.
//!
//! # Responsibilities
//! - Name the request id header assigned by the middleware stack
//! - Derive the client identity used for admission control
//!
//! # Design Decisions
//! - The forwarded header is trusted only when configured; it is set by the
//!   hosting platform's edge proxy, and any client can forge it otherwise
//! - Identity is resolved once per request and cached in extensions

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap, HeaderName},
};

use crate::config::SecurityConfig;
use crate::http::server::AppState;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Who is making the request, for rate limiting purposes. Not authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives a [`ClientIdentity`] from request headers and connection info.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    forwarded_header: Option<HeaderName>,
}

impl IdentityResolver {
    pub fn from_config(config: &SecurityConfig) -> Self {
        let forwarded_header = if config.trust_forwarded_header {
            match HeaderName::from_bytes(config.forwarded_header.as_bytes()) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::warn!(
                        header = %config.forwarded_header,
                        error = %e,
                        "Invalid forwarded header name, using connection address only"
                    );
                    None
                }
            }
        } else {
            None
        };
        Self { forwarded_header }
    }

    /// First forwarded address if trusted, else the peer address, else `"unknown"`.
    pub fn resolve(&self, headers: &HeaderMap, extensions: &Extensions) -> ClientIdentity {
        if let Some(cached) = extensions.get::<ClientIdentity>() {
            return cached.clone();
        }

        let forwarded = self
            .forwarded_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(addr) = forwarded {
            return ClientIdentity::new(addr);
        }

        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| ClientIdentity::new(addr.ip().to_string()))
            .unwrap_or_else(|| ClientIdentity::new(ClientIdentity::UNKNOWN))
    }
}

impl FromRequestParts<AppState> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = state.identity.resolve(&parts.headers, &parts.extensions);
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}
