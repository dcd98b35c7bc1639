//! Retry policy for remote calls
//!
//! Transient failures (throttling, connection resets) are retried with
//! bounded exponential backoff. The provider does not document a policy for
//! clients, so the defaults here are deliberately conservative: 5 attempts,
//! 100ms initial delay, doubling up to a 10s cap.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry configuration for remote calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff duration in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    10000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl RetryConfig {
    /// Backoff before the given attempt number.
    ///
    /// `attempt` counts completed attempts, so the delay before the second
    /// try (attempt = 1) is the initial backoff, doubling per attempt and
    /// saturating at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}
