//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SnapConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file. Missing fields take their defaults; nothing is
/// validated yet.
pub fn load_config(path: &Path) -> Result<SnapConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Resolve the effective configuration for the process.
///
/// Reads `path` when given (defaults otherwise), applies environment
/// overrides from the process environment, then validates the result.
pub fn resolve_config(path: Option<&Path>) -> Result<SnapConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SnapConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` as the variable source.
///
/// Recognised variables: `APIFY_TOKEN`, `PORT`, `APP_ENV`.
pub fn apply_env_overrides<F>(config: &mut SnapConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup("APIFY_TOKEN").filter(|t| !t.trim().is_empty()) {
        config.upstream.token = Some(token.trim().to_string());
    }

    if let Some(port) = lookup("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                let host = config
                    .listener
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host.to_string())
                    .unwrap_or_else(|| "0.0.0.0".to_string());
                config.listener.bind_address = format!("{}:{}", host, port);
            }
            Err(_) => tracing::warn!(port = %port, "Ignoring invalid PORT value"),
        }
    }

    if let Some(env) = lookup("APP_ENV").filter(|e| !e.trim().is_empty()) {
        config.environment = env;
    }
}
