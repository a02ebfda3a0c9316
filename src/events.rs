//! Built-in event log plugin.
//!
//! Appends one NDJSON record per lifecycle hook to
//! `.context/events/events.ndjson`, giving an audit trail of what happened
//! to the task state and who did it.
//!
//! # Event Format
//!
//! Each line is a JSON object with:
//! - `ts`: RFC3339 timestamp
//! - `hook`: `state_change`, `task_create` or `task_complete`
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `task`: Task ID for task events
//! - `details`: Hook-specific payload
//!
//! Hooks run outside the task-state lock, so two processes can append at
//! the same time. Each record is written with a single `write_all` on a file
//! opened in append mode, which keeps lines whole on local filesystems.

use crate::engine::WorkflowEngine;
use crate::error::{CtxError, Result};
use crate::locks::get_owner_string;
use crate::plugins::{HookPoint, HookResult, Plugin, PluginManifest, ValidationResult};
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Plugin ID of the built-in event log.
pub const EVENT_LOG_PLUGIN_ID: &str = "event-log";

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the hook fired.
    pub ts: DateTime<Utc>,

    /// Which hook fired.
    pub hook: HookPoint,

    /// Who triggered it (e.g., `user@HOST`).
    pub actor: String,

    /// Task ID for task-specific events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Hook-specific details.
    pub details: Value,
}

impl EventRecord {
    /// Create a record stamped with the current time and actor.
    pub fn new(hook: HookPoint) -> Self {
        Self {
            ts: Utc::now(),
            hook,
            actor: get_owner_string(),
            task: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task = Some(task_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize to a single JSON line, newline included.
    pub fn to_ndjson_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| CtxError::StateError(format!("failed to serialize event: {}", e)))?;
        line.push('\n');
        Ok(line)
    }
}

/// Append a record to the log at `path`, creating the file if needed.
pub fn append_event(path: &Path, record: &EventRecord) -> Result<()> {
    let line = record.to_ndjson_line()?;

    if let Some(dir) = path.parent()
        && !dir.exists()
    {
        fs::create_dir_all(dir).map_err(|e| {
            CtxError::io(
                format!("failed to create events directory '{}'", dir.display()),
                e,
            )
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CtxError::io(format!("failed to open events file '{}'", path.display()), e))?;

    file.write_all(line.as_bytes())
        .map_err(|e| CtxError::io(format!("failed to write event to '{}'", path.display()), e))
}

/// Read all records from the log. A missing log reads as empty; lines that
/// fail to parse are skipped.
pub fn read_events(path: &Path) -> Result<Vec<EventRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CtxError::io(format!("failed to read events file '{}'", path.display()), e))?;

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "skipping malformed event line");
                None
            }
        })
        .collect())
}

/// Plugin that records every lifecycle hook in the event log.
#[derive(Debug, Clone)]
pub struct EventLogPlugin {
    path: PathBuf,
}

impl EventLogPlugin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, record: EventRecord) -> HookResult {
        append_event(&self.path, &record).map_err(|e| e.to_string())
    }
}

fn task_details(task: &Task) -> Value {
    json!({
        "title": task.title,
        "status": task.status,
        "tags": task.tags,
    })
}

impl Plugin for EventLogPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(EVENT_LOG_PLUGIN_ID, "Event log", env!("CARGO_PKG_VERSION"))
    }

    fn registered_hooks(&self) -> Vec<HookPoint> {
        HookPoint::ALL.to_vec()
    }

    fn initialize(&self, _engine: &WorkflowEngine) -> HookResult {
        match self.path.parent() {
            Some(dir) if !dir.exists() => fs::create_dir_all(dir)
                .map_err(|e| format!("failed to create '{}': {}", dir.display(), e)),
            _ => Ok(()),
        }
    }

    fn on_state_change(&self, from: &str, to: &str) -> HookResult {
        self.record(
            EventRecord::new(HookPoint::StateChange).with_details(json!({"from": from, "to": to})),
        )
    }

    fn on_task_create(&self, task: &Task) -> HookResult {
        self.record(
            EventRecord::new(HookPoint::TaskCreate)
                .with_task(&task.id)
                .with_details(task_details(task)),
        )
    }

    fn on_task_complete(&self, task: &Task) -> HookResult {
        self.record(
            EventRecord::new(HookPoint::TaskComplete)
                .with_task(&task.id)
                .with_details(task_details(task)),
        )
    }

    fn validate(&self) -> ValidationResult {
        let Some(dir) = self.path.parent() else {
            return ValidationResult::invalid(vec![format!(
                "event log path '{}' has no parent directory",
                self.path.display()
            )]);
        };

        if !dir.exists() {
            return ValidationResult::ok()
                .with_warning(format!("'{}' does not exist yet", dir.display()));
        }

        match fs::metadata(&self.path) {
            Ok(meta) if meta.permissions().readonly() => ValidationResult::invalid(vec![format!(
                "event log '{}' is read-only",
                self.path.display()
            )]),
            Ok(meta) if !meta.is_file() => ValidationResult::invalid(vec![format!(
                "event log '{}' is not a regular file",
                self.path.display()
            )]),
            _ => ValidationResult::ok(),
        }
    }
}
