//! Username validation and canonicalization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};
use thiserror::Error;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,32}$").expect("username pattern is valid"));

/// Rejection produced when a raw username fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid_username")]
pub struct InvalidUsername;

/// A validated, `@`-stripped username.
///
/// Only constructible through [`Username::parse`], so holding one means the
/// value already matches `^[A-Za-z0-9._-]{1,32}$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Trim, strip one leading `@`, and validate.
    pub fn parse(raw: &str) -> Result<Self, InvalidUsername> {
        let trimmed = raw.trim();
        let candidate = trimmed.strip_prefix('@').unwrap_or(trimmed);

        if USERNAME_PATTERN.is_match(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(InvalidUsername)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cache key under which this user's profile is stored.
    pub fn cache_key(&self) -> String {
        format!("snap:{}", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Coerce a JSON `username` field into the text the validator sees.
///
/// Strings pass through, numbers use their decimal form and `true` becomes
/// `"true"`. Falsy values (`null`, `false`, `0`, `""`) and containers turn
/// into the empty string, which the validator then rejects.
pub fn coerce_raw(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => number_text(n),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Shortest decimal text for a number; integral floats lose their `.0`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}
