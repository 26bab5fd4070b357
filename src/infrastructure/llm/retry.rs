use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::DomainError;

/// Retry policy for transient upstream failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 250,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_initial_delay(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;

        Duration::from_millis(delay_ms)
    }

    /// Runs `operation` until it succeeds, fails permanently or retries run out.
    ///
    /// Only upstream errors whose kind is transient are retried.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let max_attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                tokio::time::sleep(self.delay_for_attempt(attempt - 1)).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;

                    let transient = e.upstream_kind().is_some_and(|kind| kind.is_transient());

                    if !transient || attempt >= max_attempts {
                        return Err(e);
                    }

                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Transient upstream failure, retrying"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::UpstreamService;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig::new(4)
            .with_initial_delay(100)
            .with_max_delay(1000)
            .with_backoff_multiplier(2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
        // Capped at max_delay
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let attempts = AtomicU32::new(0);

        let result = RetryConfig::new(3)
            .run("test", || async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DomainError::rate_limited(UpstreamService::Evaluator, "429"))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = RetryConfig::new(2)
            .run("test", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::unavailable(UpstreamService::Evaluator, "down"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = RetryConfig::new(5)
            .run("test", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::malformed_response(
                    UpstreamService::Evaluator,
                    "not json",
                ))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_upstream_error_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = RetryConfig::new(5)
            .run("test", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::validation("bad input"))
            })
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
