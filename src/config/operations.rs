//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{CtxError, Result};
use crate::locks::RetryPolicy;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            CtxError::io(
                format!("failed to read config file '{}'", path.display()),
                e,
            )
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from a YAML file, falling back to defaults when the file
    /// does not exist. A file that exists but fails to parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as "all defaults".
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| CtxError::UserError(format!("failed to parse config YAML: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| CtxError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock.retries` must be positive
    /// - `lock.min_backoff_ms` must be positive and not exceed `lock.max_backoff_ms`
    /// - `lock.backoff_factor` must be at least 1
    /// - `initial_state` must be non-empty
    pub fn validate(&self) -> Result<()> {
        let lock = &self.lock;

        if lock.retries == 0 {
            return Err(CtxError::UserError(
                "config validation failed: lock.retries must be greater than 0".to_string(),
            ));
        }

        if lock.min_backoff_ms == 0 {
            return Err(CtxError::UserError(
                "config validation failed: lock.min_backoff_ms must be greater than 0".to_string(),
            ));
        }

        if lock.min_backoff_ms > lock.max_backoff_ms {
            return Err(CtxError::UserError(format!(
                "config validation failed: lock.min_backoff_ms ({}) exceeds lock.max_backoff_ms ({})",
                lock.min_backoff_ms, lock.max_backoff_ms
            )));
        }

        if !lock.backoff_factor.is_finite() || lock.backoff_factor < 1.0 {
            return Err(CtxError::UserError(format!(
                "config validation failed: lock.backoff_factor must be a finite number >= 1 (found {})",
                lock.backoff_factor
            )));
        }

        if self.initial_state.trim().is_empty() {
            return Err(CtxError::UserError(
                "config validation failed: initial_state must be non-empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the lock retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.lock.retries,
            min_backoff: Duration::from_millis(self.lock.min_backoff_ms),
            max_backoff: Duration::from_millis(self.lock.max_backoff_ms),
            factor: self.lock.backoff_factor,
        }
    }
}
