//! Upstream profile source.
//!
//! # Data Flow
//! ```text
//! canonical username
//!     → apify.rs (build profile URL, start actor run, wait, list dataset)
//!     → first dataset item as RawItem
//!     → or UpstreamFailure { kind, message, status, name }
//! ```

pub mod apify;

use std::fmt;

use async_trait::async_trait;

use crate::lookup::profile::RawItem;
use crate::lookup::username::Username;

pub use apify::ApifyClient;

/// Something that can fetch the raw profile record for a username.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the first raw item for `username`.
    async fn fetch(&self, username: &Username) -> Result<RawItem, UpstreamFailure>;
}

/// Coarse kind of an upstream failure, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The actor ran but produced no items.
    NotFound,
    /// Connection-level failure.
    Network,
    /// A deadline was exceeded.
    Timeout,
    /// Credentials were rejected.
    Auth,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::Network => "upstream_network",
            FailureKind::Timeout => "upstream_timeout",
            FailureKind::Auth => "upstream_auth",
            FailureKind::Unknown => "upstream_unknown",
        }
    }
}

/// A failed upstream call, kept only long enough to classify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub kind: FailureKind,
    pub message: String,
    pub status: Option<u16>,
    pub name: Option<String>,
}

impl UpstreamFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            name: None,
        }
    }

    pub fn not_found() -> Self {
        Self::new(FailureKind::NotFound, "Profile not found or no data returned")
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace every occurrence of `secret` in the message.
    pub fn redact(mut self, secret: Option<&str>) -> Self {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            if self.message.contains(secret) {
                self.message = self.message.replace(secret, "[redacted]");
            }
        }
        self
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for UpstreamFailure {}
