//! Task-state document model for ctxflow.
//!
//! All task state lives in one JSON document, `.context/tasks.json`:
//!
//! ```text
//! {
//!   "version": 1,
//!   "workflow_state": "draft",
//!   "next_id": 3,
//!   "tasks": [
//!     { "id": "TASK-001", "title": "Write parser", "status": "done", ... },
//!     { "id": "TASK-002", "title": "Wire CLI", "status": "pending", ... }
//!   ]
//! }
//! ```
//!
//! Unknown top-level fields are preserved across load/save so that newer
//! tools writing extra data do not lose it when an older ctxflow rewrites the
//! file.
//!
//! The document is only ever mutated inside the task-state lock; see
//! [`crate::engine`].

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

mod io;
mod mutations;

/// Current document format version.
pub const STATE_VERSION: u32 = 1;

/// Regex pattern for valid task IDs.
static TASK_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TASK-\d{3,}$").expect("Invalid task ID regex"));

/// Check whether a string is a well-formed task ID (e.g., `TASK-001`).
pub fn is_valid_task_id(id: &str) -> bool {
    TASK_ID_REGEX.is_match(id)
}

/// Format a task number as a task ID, zero-padded to three digits.
pub fn format_task_id(number: u32) -> String {
    format!("TASK-{:03}", number)
}

/// Normalize user input into a task ID.
///
/// Accepts `TASK-001`, `task-1`, or a bare number like `7`.
pub fn normalize_task_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("TASK-")
        .or_else(|| trimmed.strip_prefix("task-"))
        .unwrap_or(trimmed);

    let number: u32 = digits.parse().ok()?;
    let id = format_task_id(number);
    is_valid_task_id(&id).then_some(id)
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Pending,
    /// Someone is working on it.
    InProgress,
    /// Waiting on something outside the task.
    Blocked,
    /// Finished.
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier (e.g., "TASK-001").
    pub id: String,

    /// Task title.
    pub title: String,

    /// Current status.
    #[serde(default)]
    pub status: TaskStatus,

    /// Tags for categorization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// When the task first moved to in_progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the task was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// The whole task-state document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Opaque workflow state name (e.g., "draft", "active").
    pub workflow_state: String,

    /// Number assigned to the next created task.
    #[serde(default = "default_next_id")]
    pub next_id: u32,

    /// Tasks in creation order.
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Any fields not explicitly defined above.
    /// Using BTreeMap for deterministic serialization order.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

fn default_next_id() -> u32 {
    1
}

impl StateDocument {
    /// Create an empty document in the given workflow state.
    pub fn new(initial_state: &str) -> Self {
        Self {
            version: STATE_VERSION,
            workflow_state: initial_state.to_string(),
            next_id: default_next_id(),
            tasks: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Look up a task by ID.
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Count tasks in each status.
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for task in &self.tasks {
            *counts.entry(task.status.as_str()).or_insert(0) += 1;
        }
        counts
    }
}
