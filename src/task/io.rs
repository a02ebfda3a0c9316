//! Loading and saving the task-state document.

use super::{STATE_VERSION, StateDocument};
use crate::error::{CtxError, Result};
use crate::fs::atomic_write_file;
use std::path::Path;

impl StateDocument {
    /// Parse a document from JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let doc: StateDocument = serde_json::from_str(content)
            .map_err(|e| CtxError::StateError(format!("failed to parse task state: {}", e)))?;

        if doc.version > STATE_VERSION {
            return Err(CtxError::StateError(format!(
                "task state version {} is newer than supported version {}; upgrade ctxflow",
                doc.version, STATE_VERSION
            )));
        }

        doc.check_consistency()?;
        Ok(doc)
    }

    /// Serialize the document to pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| CtxError::StateError(format!("failed to serialize task state: {}", e)))?;
        json.push('\n');
        Ok(json)
    }

    /// Load the document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CtxError::io(
                format!("failed to read task state '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json(&content)
    }

    /// Write the document to disk atomically.
    ///
    /// Callers must hold the task-state lock.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        atomic_write_file(path, &json)
    }

    /// Reject documents whose IDs collide or would be reissued.
    fn check_consistency(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(CtxError::StateError(format!(
                    "duplicate task id '{}' in task state",
                    task.id
                )));
            }
        }

        let max_number = self
            .tasks
            .iter()
            .filter_map(|t| t.id.strip_prefix("TASK-").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        if self.next_id <= max_number {
            return Err(CtxError::StateError(format!(
                "next_id {} would reuse an existing task id (highest is {})",
                self.next_id, max_number
            )));
        }

        Ok(())
    }
}
