//! Backoff schedule for read-only RPC calls

use super::error::RpcError;
use std::time::Duration;

/// How often, and how long apart, a failed read is sent again
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    /// Upper bound for every wait, including a node's `Retry-After`
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Wait before sending attempt `attempt + 1` after `err`.
    ///
    /// `attempt` counts failures so far, starting at 1. `None` means give up:
    /// the error is final or the retries are spent. A rate limit that names
    /// its own `Retry-After` is waited out, never less than the schedule.
    pub fn delay_after(&self, attempt: u32, err: &RpcError) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries || !err.is_retryable() {
            return None;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let scheduled = (self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent)) as u64;

        let wait_ms = match err {
            RpcError::RateLimited {
                retry_after_secs: Some(secs),
            } => secs.saturating_mul(1000).max(scheduled),
            _ => scheduled,
        };

        Some(Duration::from_millis(wait_ms.min(self.max_delay_ms)))
    }
}
