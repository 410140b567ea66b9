//! Snapchat profile lookup proxy.
//!
//! Accepts a username, runs the configured Apify actor for it, normalizes
//! the first result into a [`lookup::Profile`] and caches it for a short
//! while.

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod upstream;

pub use config::SnapConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
