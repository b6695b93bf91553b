use crate::shared::config::RetryConfig;
use std::time::Duration;

/// Re-sends of the same request (same idempotency token) after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Linear backoff: the n-th retry waits n * backoff.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.backoff_ms))
    }
}
