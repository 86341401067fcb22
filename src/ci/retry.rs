//! Exponential backoff retry for CI API calls.
//!
//! Only transient errors are retried. Permanent errors are returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::CiError;

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 3 retries with 2s, 4s, 8s delays.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
        backoff_multiplier: 2.0,
    };

    /// Delay before retry number `attempt` (0-indexed):
    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }
}

/// Runs `operation`, retrying transient failures with exponential backoff.
///
/// Returns the first success, the first permanent error, or the last
/// transient error once retries are exhausted.
pub async fn retry_with_backoff<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, CiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CiError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.kind.is_retriable() || attempt >= config.max_retries => return Err(e),
            Err(e) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Transient CI API error, retrying"
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
