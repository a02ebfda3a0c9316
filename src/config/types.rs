//! Configuration types and defaults for ctxflow.

use serde::{Deserialize, Serialize};

/// Retry settings for acquiring the task-state lock.
///
/// Defaults tolerate short-lived holders from concurrent CLI invocations
/// and parallel test workers: 30 retries, 200 ms first wait, doubling up to
/// 3 s per wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Retries after the first failed attempt.
    pub retries: u32,

    /// Wait before the first retry, in milliseconds.
    pub min_backoff_ms: u64,

    /// Upper bound for any single wait, in milliseconds.
    pub max_backoff_ms: u64,

    /// Multiplier applied to the wait after each retry.
    pub backoff_factor: f64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_LOCK_RETRIES,
            min_backoff_ms: DEFAULT_MIN_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

pub const DEFAULT_LOCK_RETRIES: u32 = 30;
pub const DEFAULT_MIN_BACKOFF_MS: u64 = 200;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 3000;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_initial_state() -> String {
    "draft".to_string()
}
