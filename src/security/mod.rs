//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin gate, preflight short-circuit)
//!     → method check (axum method router, 405)
//!     → rate_limit.rs (per-identity fixed window, 429)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Preflight never reaches admission control
//! - Rejected origins lose CORS headers; the browser enforces the block
//! - Admission is decided before any body is read

pub mod cors;
pub mod rate_limit;

pub use cors::{cors_middleware, OriginPolicy};
pub use rate_limit::{
    rate_limit_middleware, Admission, AdmissionStore, FixedWindowLimiter, RateLimitState, Sweeper,
};
