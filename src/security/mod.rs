//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (CORS, concurrency cap, body size)
//!     → rate_limit.rs (per-IP budget, lookup routes only)
//!     → lookup handlers
//! ```

pub mod limits;
pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, Decision, RateLimiter};
