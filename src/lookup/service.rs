//! Lookup orchestration.
//!
//! # States
//! ```text
//! Validating → CacheCheck ─┬─ hit  → Responding
//!                          └─ miss → Fetching → Normalizing → Caching → Responding
//! any failure              → Failing → Responding
//! ```
//!
//! Retries happen only inside `Fetching`, through the [`RetryPolicy`]. The
//! fetch/normalize section runs under `catch_unwind`; a panic there ends the
//! lookup as `internal_error` instead of tearing down the connection task.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tracing::Instrument;

use crate::cache::ProfileCache;
use crate::lookup::error::{classify, ClassifiedError, LookupError};
use crate::lookup::profile::Profile;
use crate::lookup::username::Username;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::upstream::ProfileSource;

/// How much effort a lookup spends on the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Apply the configured retry policy.
    Full,
    /// One upstream attempt, used by the GET smoke-check route.
    SingleAttempt,
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub cached: bool,
    pub profile: Arc<Profile>,
}

/// Validate → cache → fetch → normalize → cache pipeline.
pub struct LookupService {
    cache: Arc<dyn ProfileCache>,
    source: Arc<dyn ProfileSource>,
    retry: RetryPolicy,
}

impl LookupService {
    pub fn new(
        cache: Arc<dyn ProfileCache>,
        source: Arc<dyn ProfileSource>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            cache,
            source,
            retry,
        }
    }

    /// Run one lookup for a raw, unvalidated username.
    pub async fn lookup(&self, raw: &str, mode: LookupMode) -> Result<LookupOutcome, LookupError> {
        let start = Instant::now();

        let username = match Username::parse(raw) {
            Ok(username) => username,
            Err(e) => {
                tracing::debug!(raw = %raw, "Rejected username");
                metrics::record_lookup("invalid_username", start);
                return Err(e.into());
            }
        };

        let span = tracing::info_span!(
            "lookup",
            username = %username,
            mode = ?mode,
            attempts = tracing::field::Empty,
        );
        let result = self.resolve(&username, mode).instrument(span).await;

        let outcome = match &result {
            Ok(LookupOutcome { cached: true, .. }) => "hit",
            Ok(LookupOutcome { cached: false, .. }) => "miss",
            Err(e) => e.code(),
        };
        metrics::record_lookup(outcome, start);
        result
    }

    async fn resolve(&self, username: &Username, mode: LookupMode) -> Result<LookupOutcome, LookupError> {
        let key = username.cache_key();

        if let Some(profile) = self.cache.get(&key) {
            tracing::debug!("Cache hit");
            return Ok(LookupOutcome {
                cached: true,
                profile,
            });
        }

        let fetched = AssertUnwindSafe(self.fetch_and_normalize(username, mode))
            .catch_unwind()
            .await;

        let profile = match fetched {
            Ok(Ok(profile)) => Arc::new(profile),
            Ok(Err(e)) => {
                tracing::warn!(category = e.category.code(), detail = %e.detail, "Lookup failed");
                return Err(e.into());
            }
            Err(panic) => {
                tracing::error!(panic = %panic_message(panic.as_ref()), "Lookup pipeline panicked");
                return Err(ClassifiedError::internal(INTERNAL_DETAIL).into());
            }
        };

        self.cache.set(key, profile.clone());
        tracing::info!(cached = false, "Profile fetched");
        Ok(LookupOutcome {
            cached: false,
            profile,
        })
    }

    async fn fetch_and_normalize(
        &self,
        username: &Username,
        mode: LookupMode,
    ) -> Result<Profile, ClassifiedError> {
        let policy = match mode {
            LookupMode::Full => self.retry,
            LookupMode::SingleAttempt => RetryPolicy::single_attempt(),
        };

        let outcome = policy
            .run(|_| async move {
                let result = self.source.fetch(username).await;
                metrics::record_upstream_attempt(result.is_ok());
                result
            })
            .await;
        tracing::Span::current().record("attempts", outcome.attempts);

        let item = outcome.result.map_err(|failure| classify(&failure))?;
        Ok(Profile::normalize(&item, username))
    }
}

/// Detail returned for `internal_error`; the panic payload is only logged.
const INTERNAL_DETAIL: &str = "internal error while processing lookup";

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure while processing lookup".to_string()
    }
}
