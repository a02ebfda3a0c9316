//! Backoff schedule for lock acquisition.

use crate::config::types::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_LOCK_RETRIES, DEFAULT_MAX_BACKOFF_MS, DEFAULT_MIN_BACKOFF_MS,
};
use std::time::Duration;

/// Bounded exponential backoff.
///
/// The first attempt happens immediately. After the n-th failed attempt
/// (0-based) the caller waits `min_backoff * factor^n`, capped at
/// `max_backoff`, up to `retries` times.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Wait before the first retry.
    pub min_backoff: Duration,
    /// Upper bound for a single wait.
    pub max_backoff: Duration,
    /// Growth factor between consecutive waits.
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_LOCK_RETRIES,
            min_backoff: Duration::from_millis(DEFAULT_MIN_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Total number of lock attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Wait after the given failed attempt (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let min = self.min_backoff.as_secs_f64();
        let max = self.max_backoff.as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = (min * self.factor.powi(exponent)).min(max);
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Sum of all waits when every attempt is contended.
    pub fn total_budget(&self) -> Duration {
        (0..self.retries).map(|attempt| self.delay(attempt)).sum()
    }
}
