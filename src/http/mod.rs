//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, graceful shutdown)
//!     → request.rs (request ID, tracing span)
//!     → lookup.rs / health.rs (handlers)
//!     → response.rs (JSON bodies, status mapping)
//!     → Send to client
//! ```

pub mod health;
pub mod lookup;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
