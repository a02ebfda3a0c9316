//! The plugin capability contract.

use super::hooks::HookPoint;
use crate::engine::WorkflowEngine;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a plugin hook. The error string is surfaced to the user.
pub type HookResult = Result<(), String>;

/// Descriptive plugin metadata. Only `id` carries identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Unique plugin identifier.
    pub id: String,
    /// Human-readable plugin name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
}

impl PluginManifest {
    pub fn new(id: &str, name: &str, version: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for PluginManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} v{})", self.id, self.name, self.version)
    }
}

/// Result of a plugin's self-check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the plugin considers itself usable.
    pub valid: bool,
    /// Problems that make the plugin unusable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Problems worth reporting that do not block use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A passing result with no findings.
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A failing result.
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// A workflow plugin.
///
/// Only [`manifest`](Plugin::manifest) is required. Hooks default to doing
/// nothing.
///
/// A hook runs only when it is both implemented and declared: overriding
/// `on_task_create` without listing [`HookPoint::TaskCreate`] in
/// [`registered_hooks`](Plugin::registered_hooks) means the override is
/// never called. Subscriptions are read once, at registration.
pub trait Plugin: Send + Sync + fmt::Debug {
    /// Identity and descriptive metadata.
    fn manifest(&self) -> PluginManifest;

    /// Hook points this plugin subscribes to. Each one needs the matching
    /// `on_*` method overridden to have any effect.
    fn registered_hooks(&self) -> Vec<HookPoint> {
        Vec::new()
    }

    /// Called once at registration when an engine is bound.
    fn initialize(&self, _engine: &WorkflowEngine) -> HookResult {
        Ok(())
    }

    /// Called after the workflow state changes.
    fn on_state_change(&self, _from: &str, _to: &str) -> HookResult {
        Ok(())
    }

    /// Called after a task is created.
    fn on_task_create(&self, _task: &Task) -> HookResult {
        Ok(())
    }

    /// Called after a task is completed.
    fn on_task_complete(&self, _task: &Task) -> HookResult {
        Ok(())
    }

    /// Self-check, reported by `ctxflow plugins`.
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}
