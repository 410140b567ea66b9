//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → HttpServer stops accepting, drains in-flight requests
//!               → background tasks (rate limiter pruning) exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
