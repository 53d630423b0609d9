//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream service:
//!     → timeouts.rs (deadline on every call)
//!
//! Background notification delivery:
//!     → backoff.rs (exponential backoff with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Inline request paths never retry; only the outbox does

pub mod backoff;
pub mod timeouts;

pub use backoff::Backoff;
pub use timeouts::with_deadline;
