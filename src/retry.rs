//! Bounded retry with exponential backoff for hosted provider calls.
//!
//! Every embedding and completion request goes through a [`RetryPolicy`], so
//! the number of attempts, the backoff shape and the per-call timeout are
//! owned here rather than inside a provider client.

use crate::config::RetrySettings;
use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for provider calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Timeout applied to each individual attempt.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Build a policy from configuration.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }

    /// A policy that never retries.
    pub fn no_retry(request_timeout: Duration) -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            request_timeout,
        }
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based), doubling each time.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Each attempt is bounded by `request_timeout`; a timeout counts as a
    /// transient failure.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.request_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.request_timeout)),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Provider call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts() => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Transient provider error, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
