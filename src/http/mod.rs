//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, routes)
//!     → request.rs (request id, client identity)
//!     → security (origin gate, admission control)
//!     → handlers
//!     → response.rs (error detail, diagnostics)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientIdentity, IdentityResolver, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError, Services};
