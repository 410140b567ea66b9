//! Retry logic.
//!
//! # Responsibilities
//! - Run an operation up to `max_attempts` times
//! - Sleep a fixed delay between attempts
//! - Report the final result together with the number of attempts made
//!
//! Every failure is retried except on the last attempt, which is surfaced
//! as-is. There is no retryable/non-retryable split.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;

/// Fixed-delay, bounded-attempt retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Number of attempts actually made (>= 1).
    pub attempts: u32,
    /// First success, or the failure of the last attempt.
    pub result: Result<T, E>,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        attempts: attempt,
                        result: Ok(value),
                    }
                }
                Err(err) if attempt >= self.max_attempts => {
                    tracing::debug!(attempt, error = %err, "Final attempt failed");
                    return RetryOutcome {
                        attempts: attempt,
                        result: Err(err),
                    };
                }
                Err(err) => {
                    tracing::warn!(attempt, delay = ?self.delay, error = %err, "Attempt failed, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_two_attempts_then_last_error() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let outcome: RetryOutcome<(), String> = policy
            .run(|attempt| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {}", attempt))
                }
            })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result.unwrap_err(), "failure 2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1600), "slept more than once: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_retry() {
        let policy = RetryPolicy::new(2, Duration::from_millis(800));

        let outcome = policy
            .run(|attempt| async move {
                if attempt == 1 {
                    Err("flaky")
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let policy = RetryPolicy::default();
        let start = Instant::now();

        let outcome: RetryOutcome<u8, &str> = policy.run(|_| async { Ok(7) }).await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result, Ok(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let policy = RetryPolicy::single_attempt();
        let outcome: RetryOutcome<(), &str> = policy.run(|_| async { Err("down") }).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
