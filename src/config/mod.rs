//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → SnapConfig (validated, immutable)
//!     → handed to HttpServer at startup
//! ```
//!
//! All fields have defaults so an empty file (or no file) is a valid config.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    CacheConfig, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig, RetryConfig,
    SecurityConfig, SnapConfig, TimeoutConfig, UpstreamConfig,
};
