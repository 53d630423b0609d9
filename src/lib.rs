//! RIS Foods site API.
//!
//! Backend for the RIS Foods marketing site: a chat proxy to a
//! generative-language model and three public form endpoints, behind a
//! per-request origin gate and per-endpoint fixed-window rate limiting.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;

// Request handling
pub mod forms;
pub mod handlers;
pub mod services;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::AppConfig;
pub use error::ApiError;
pub use http::{HttpServer, Services};
pub use lifecycle::Shutdown;
