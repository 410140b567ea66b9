//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts, capacities, windows > 0)
//! - Check that URLs and bind addresses parse
//!
//! Returns every error found, not just the first.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::SnapConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &SnapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let upstream = &config.upstream;
    for (field, value) in [
        ("upstream.api_base", &upstream.api_base),
        ("upstream.profile_base", &upstream.profile_base),
    ] {
        if let Err(e) = Url::parse(value) {
            errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
        }
    }
    if upstream.actor_id.trim().is_empty() {
        errors.push(ValidationError::new("upstream.actor_id", "must not be empty"));
    }
    if upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be > 0"));
    }
    if upstream.run_wait_secs >= upstream.request_timeout_secs {
        errors.push(ValidationError::new(
            "upstream.run_wait_secs",
            "must be shorter than upstream.request_timeout_secs",
        ));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }

    let budget = worst_case_lookup(config);
    if config.timeouts.request_secs > 0 && Duration::from_secs(config.timeouts.request_secs) <= budget {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed the worst-case upstream budget of {:.1}s (attempts x (max_run_wait + 3 x request_timeout) + delays)",
                budget.as_secs_f64()
            ),
        ));
    }

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::new("cache.max_entries", "must be > 0"));
    }
    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be > 0"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be > 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be > 0"));
        }
    }

    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::new("security.max_body_bytes", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Longest a fully retried lookup can spend upstream.
///
/// One attempt is the run start, polling up to `max_run_wait_secs` plus one
/// last poll, and the dataset listing; each HTTP call is bounded by
/// `request_timeout_secs`.
pub fn worst_case_lookup(config: &SnapConfig) -> Duration {
    let attempts = config.retries.max_attempts.max(1);
    let upstream = &config.upstream;
    let per_attempt = Duration::from_secs(upstream.max_run_wait_secs)
        + Duration::from_secs(upstream.request_timeout_secs) * 3;
    per_attempt * attempts + Duration::from_millis(config.retries.delay_ms) * (attempts - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&SnapConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SnapConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.api_base = "not a url".into();
        config.cache.ttl_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["listener.bind_address", "upstream.api_base", "cache.ttl_secs"]);
    }

    #[test]
    fn test_worst_case_lookup_with_defaults() {
        let config = SnapConfig::default();
        assert_eq!(worst_case_lookup(&config), Duration::from_millis(330_800));
        assert!(Duration::from_secs(config.timeouts.request_secs) > worst_case_lookup(&config));
    }

    #[test]
    fn test_request_timeout_must_cover_retries() {
        let mut config = SnapConfig::default();
        config.timeouts.request_secs = 300;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
        assert!(errors[0].reason.contains("330.8s"), "{}", errors[0].reason);

        config.timeouts.request_secs = 300;
        config.upstream.max_run_wait_secs = 90;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_disabled_rate_limit_is_not_checked() {
        let mut config = SnapConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;

        assert!(validate_config(&config).is_ok());
    }
}
