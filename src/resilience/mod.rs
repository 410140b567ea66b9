//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream fetch:
//!     → retries.rs (attempt, fixed delay, attempt again)
//!     → RetryOutcome { attempts, result }
//! ```
//!
//! Per-call deadlines live in the upstream client (reqwest timeout); the
//! whole request is bounded by the HTTP timeout layer.

pub mod retries;

pub use retries::{RetryOutcome, RetryPolicy};
