//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a ctxflow project.
///
/// This struct represents the contents of `.context/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Retry/backoff policy for the task-state lock.
    pub lock: LockSettings,

    // =========================================================================
    // Workflow settings
    // =========================================================================
    /// Workflow state written into a freshly initialized task document.
    #[serde(default = "default_initial_state")]
    pub initial_state: String,

    // =========================================================================
    // Built-in plugins
    // =========================================================================
    /// Register the NDJSON event-log plugin when the engine opens.
    #[serde(default = "default_true")]
    pub event_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock: LockSettings::default(),
            initial_state: default_initial_state(),
            event_log: default_true(),
        }
    }
}
