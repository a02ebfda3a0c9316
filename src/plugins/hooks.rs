//! Lifecycle events and the hook points they map to.

use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension points a plugin can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// The workflow state changed.
    StateChange,
    /// A task was created.
    TaskCreate,
    /// A task was completed.
    TaskComplete,
}

impl HookPoint {
    /// All hook points, in a stable order.
    pub const ALL: [HookPoint; 3] = [
        HookPoint::StateChange,
        HookPoint::TaskCreate,
        HookPoint::TaskComplete,
    ];

    /// Name of the [`crate::plugins::Plugin`] method serving this hook point.
    pub fn method_name(&self) -> &'static str {
        match self {
            HookPoint::StateChange => "on_state_change",
            HookPoint::TaskCreate => "on_task_create",
            HookPoint::TaskComplete => "on_task_complete",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// A lifecycle event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// Workflow state moved from `from` to `to`.
    StateChange { from: String, to: String },
    /// A task was created.
    TaskCreate(Task),
    /// A task was completed.
    TaskComplete(Task),
}

impl WorkflowEvent {
    /// The hook point this event is delivered to.
    pub fn hook_point(&self) -> HookPoint {
        match self {
            WorkflowEvent::StateChange { .. } => HookPoint::StateChange,
            WorkflowEvent::TaskCreate(_) => HookPoint::TaskCreate,
            WorkflowEvent::TaskComplete(_) => HookPoint::TaskComplete,
        }
    }

    /// Task ID carried by the event, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            WorkflowEvent::StateChange { .. } => None,
            WorkflowEvent::TaskCreate(task) | WorkflowEvent::TaskComplete(task) => Some(&task.id),
        }
    }
}
