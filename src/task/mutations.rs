//! Mutation helpers used by the engine inside the task-state lock.

use super::{StateDocument, Task, TaskStatus, format_task_id};
use crate::error::{CtxError, Result};
use chrono::Utc;

impl StateDocument {
    /// Append a new pending task and allocate its ID.
    pub fn add_task(&mut self, title: &str, tags: Vec<String>) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CtxError::UserError("task title must not be empty".to_string()));
        }

        let following = self.next_id.checked_add(1).ok_or_else(|| {
            CtxError::StateError(format!(
                "task id space exhausted: next_id {} cannot be advanced",
                self.next_id
            ))
        })?;

        let task = Task {
            id: format_task_id(self.next_id),
            title: title.to_string(),
            status: TaskStatus::Pending,
            tags,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.next_id = following;
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CtxError::UserError(format!("task '{}' not found", id)))
    }

    /// Move a task to a new status, stamping lifecycle timestamps.
    ///
    /// Returns the task as it is after the change.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        let task = self.find_mut(id)?;
        let now = Utc::now();

        match status {
            TaskStatus::InProgress => {
                if task.started_at.is_none() {
                    task.started_at = Some(now);
                }
                task.completed_at = None;
            }
            TaskStatus::Done => {
                task.completed_at = Some(now);
            }
            TaskStatus::Pending | TaskStatus::Blocked => {
                task.completed_at = None;
            }
        }
        task.status = status;
        Ok(task.clone())
    }

    /// Mark a task done. Completing an already-done task is an error so the
    /// completion hook fires once per completion.
    pub fn complete(&mut self, id: &str) -> Result<Task> {
        let task = self.find_mut(id)?;
        if task.status == TaskStatus::Done {
            return Err(CtxError::UserError(format!(
                "task '{}' is already done",
                id
            )));
        }
        self.set_status(id, TaskStatus::Done)
    }

    /// Replace the workflow state. Returns `(from, to)` when the state
    /// actually changed.
    pub fn set_workflow_state(&mut self, to: &str) -> Result<Option<(String, String)>> {
        let to = to.trim();
        if to.is_empty() {
            return Err(CtxError::UserError(
                "workflow state must not be empty".to_string(),
            ));
        }
        if self.workflow_state == to {
            return Ok(None);
        }
        let from = std::mem::replace(&mut self.workflow_state, to.to_string());
        Ok(Some((from, to.to_string())))
    }
}
