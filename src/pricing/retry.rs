//! Retry policy for provider requests
//!
//! Retryable failures (timeouts, connection errors, 5xx) back off
//! exponentially through `tokio_retry2`. A rate-limit response waits for the
//! provider's Retry-After instead and still counts as an attempt. Anything
//! else is surfaced on the first try.

use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::warn;

use crate::common::errors::{BotError, Result};
use crate::config::types::TcgPlayerConfig;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    pub base_delay: Duration,
    /// Longest Retry-After wait we honor
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &TcgPlayerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_retry_after: Duration::from_secs(config.max_retry_after_seconds),
        }
    }

    /// Backoff after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Wait before the next attempt after `error` ended attempt `attempt`
    pub fn delay_for(&self, error: &BotError, attempt: u32) -> Duration {
        match error {
            BotError::RateLimit {
                retry_after_seconds: Some(seconds),
                ..
            } => Duration::from_secs(*seconds).min(self.max_retry_after),
            _ => self.backoff(attempt),
        }
    }

    /// Delays between attempts: one per retry after the first attempt
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        let policy = *self;
        (1..policy.max_attempts).map(move |attempt| policy.backoff(attempt))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// A rate limit carrying Retry-After replaces that step's backoff but still
    /// consumes it. Exhausted retryable failures are reported as
    /// `BotError::PriceFetch`.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = *self;
        let mut attempts = 0;

        let outcome = Retry::spawn(self.strategy(), || {
            attempts += 1;
            let attempt = attempts;
            let call = operation(attempt);
            async move {
                match call.await {
                    Ok(value) => Ok(value),
                    Err(e) if !e.is_retryable() => Err(RetryError::Permanent(e)),
                    Err(e) => {
                        let retry_after = matches!(
                            e,
                            BotError::RateLimit {
                                retry_after_seconds: Some(_),
                                ..
                            }
                        )
                        .then(|| policy.delay_for(&e, attempt));
                        match retry_after {
                            Some(wait) => warn!(
                                attempt,
                                wait_ms = wait.as_millis() as u64,
                                "{} rate limited, honoring retry-after",
                                label
                            ),
                            None => warn!(attempt, "Transient error on {}: {}", label, e),
                        }
                        Err(RetryError::Transient { err: e, retry_after })
                    }
                }
            }
        })
        .await;

        match outcome {
            Ok(value) => Ok(value),
            Err(e) if e.is_retryable() => Err(BotError::PriceFetch(format!(
                "{} failed after {} attempts: {}",
                label, attempts, e
            ))),
            Err(e) => Err(e),
        }
    }
}
