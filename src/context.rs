//! Context directory resolution for ctxflow.
//!
//! All ctxflow state lives in a hidden `.context/` directory at the project
//! root. Commands may be invoked from any subdirectory: resolution walks up
//! from the working directory until it finds an existing `.context/`. When
//! none exists (before `ctxflow init`), the working directory itself is
//! treated as the project root.
//!
//! Every process that wants to interoperate on the same task state must
//! resolve the same directory, because the lock artifact lives inside it.

use crate::error::{CtxError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the hidden context directory.
pub const CONTEXT_DIR: &str = ".context";

/// Task-state document file name.
pub const STATE_FILE: &str = "tasks.json";

/// Lock artifact file name guarding the task-state document.
pub const LOCK_FILE: &str = "tasks.lock";

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.yaml";

/// Resolved paths for a ctxflow project. All paths are absolute when
/// produced by [`WorkflowContext::resolve`].
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    /// Directory containing `.context/`.
    pub project_root: PathBuf,

    /// The `.context/` directory itself.
    pub context_dir: PathBuf,
}

impl WorkflowContext {
    /// Resolve the context from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir()
            .map_err(|e| CtxError::io("failed to get current working directory", e))?;

        Ok(Self::resolve_from(cwd))
    }

    /// Resolve the context starting from a specific directory.
    pub fn resolve_from<P: AsRef<Path>>(start: P) -> Self {
        let start = start.as_ref();
        let root = start
            .ancestors()
            .find(|dir| dir.join(CONTEXT_DIR).is_dir())
            .unwrap_or(start);

        Self::at(root)
    }

    /// Build a context rooted exactly at `project_root`, without searching.
    pub fn at<P: AsRef<Path>>(project_root: P) -> Self {
        let project_root = project_root.as_ref().to_path_buf();
        let context_dir = project_root.join(CONTEXT_DIR);
        Self {
            project_root,
            context_dir,
        }
    }

    /// Check if the context directory exists.
    pub fn is_initialized(&self) -> bool {
        self.context_dir.is_dir()
    }

    /// Ensure the project is initialized, returning an error if not.
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(CtxError::UserError(format!(
                "ctxflow is not initialized.\n\
                 Expected context directory at: {}\n\n\
                 Run `ctxflow init` to create it.",
                self.context_dir.display()
            )));
        }
        Ok(())
    }

    /// Path to the task-state document.
    pub fn state_path(&self) -> PathBuf {
        self.context_dir.join(STATE_FILE)
    }

    /// Path to the lock artifact.
    pub fn lock_path(&self) -> PathBuf {
        self.context_dir.join(LOCK_FILE)
    }

    /// Path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.context_dir.join(CONFIG_FILE)
    }

    /// Path to the events directory.
    pub fn events_dir(&self) -> PathBuf {
        self.context_dir.join("events")
    }

    /// Path to the event log file.
    pub fn events_file(&self) -> PathBuf {
        self.events_dir().join("events.ndjson")
    }
}

/// Resolve context and ensure the project is initialized.
///
/// Use this in every command except `init`.
pub fn require_initialized() -> Result<WorkflowContext> {
    let ctx = WorkflowContext::resolve()?;
    ctx.ensure_initialized()?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_from_uninitialized_uses_start_dir() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = WorkflowContext::resolve_from(temp_dir.path());

        assert_eq!(ctx.project_root, temp_dir.path());
        assert!(ctx.context_dir.ends_with(CONTEXT_DIR));
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_resolve_from_subdirectory_finds_context() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join(CONTEXT_DIR)).unwrap();
        let nested = temp_dir.path().join("src").join("nested");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = WorkflowContext::resolve_from(&nested);

        assert_eq!(ctx.project_root, temp_dir.path());
        assert!(ctx.is_initialized());
    }

    #[test]
    fn test_ensure_initialized_mentions_init() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = WorkflowContext::at(temp_dir.path());

        let err = ctx.ensure_initialized().unwrap_err();
        assert!(matches!(err, CtxError::UserError(_)));
        assert!(err.to_string().contains("ctxflow init"));
    }

    #[test]
    fn test_fixed_paths() {
        let ctx = WorkflowContext::at("/project");

        assert_eq!(ctx.state_path(), Path::new("/project/.context/tasks.json"));
        assert_eq!(ctx.lock_path(), Path::new("/project/.context/tasks.lock"));
        assert_eq!(ctx.config_path(), Path::new("/project/.context/config.yaml"));
        assert!(ctx.events_file().ends_with("events/events.ndjson"));
    }

    #[test]
    #[serial]
    fn test_require_initialized_from_cwd() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        assert!(require_initialized().is_err());

        std::fs::create_dir_all(temp_dir.path().join(CONTEXT_DIR)).unwrap();
        let ctx = require_initialized().unwrap();
        assert_eq!(
            ctx.project_root.canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }
}
