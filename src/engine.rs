//! Workflow engine: the only writer of the task-state document.
//!
//! Every mutation follows the same sequence:
//!
//! 1. take the in-process mutex around the engine's lock handle
//! 2. acquire the cross-process lock (`with_exclusive`)
//! 3. load, mutate and atomically save `tasks.json`
//! 4. release both locks
//! 5. dispatch the lifecycle event to plugins
//!
//! Step 5 runs outside the critical section, so a slow or misbehaving
//! plugin cannot extend the lock hold time, and a plugin that calls back
//! into the engine does not deadlock. The state change is already durable
//! when a hook runs; a failing hook is reported to the caller but does not
//! undo it.

use crate::config::Config;
use crate::context::WorkflowContext;
use crate::error::{CtxError, Result};
use crate::events::EventLogPlugin;
use crate::locks::{ExclusiveLock, FileLock};
use crate::plugins::{PluginManager, WorkflowEvent};
use crate::task::{StateDocument, Task, TaskStatus};
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info};

/// Owns the task-state document and the plugin registry.
#[derive(Debug)]
pub struct WorkflowEngine {
    ctx: WorkflowContext,
    config: Config,
    lock: Mutex<FileLock>,
    plugins: PluginManager,
    handle: Weak<WorkflowEngine>,
}

impl WorkflowEngine {
    /// Open the engine for an initialized project and register the built-in
    /// plugins enabled in `config`.
    pub fn open(ctx: WorkflowContext, config: Config) -> Result<Arc<Self>> {
        ctx.ensure_initialized()?;
        let engine = Self::new(ctx, config);

        if engine.config.event_log {
            engine
                .plugins
                .register(Arc::new(EventLogPlugin::new(engine.ctx.events_file())))?;
        }

        Ok(engine)
    }

    /// Build an engine with an empty plugin registry bound to it.
    pub fn new(ctx: WorkflowContext, config: Config) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            let plugins = PluginManager::new();
            plugins.set_engine(weak.clone());
            let lock = FileLock::new(ctx.lock_path(), config.retry_policy());

            Self {
                ctx,
                config,
                lock: Mutex::new(lock),
                plugins,
                handle: weak.clone(),
            }
        })
    }

    /// Resolved project paths.
    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The plugin registry.
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// A weak handle to this engine, for plugins that need to call back
    /// into it after `initialize` returns.
    pub fn handle(&self) -> Weak<WorkflowEngine> {
        self.handle.clone()
    }

    /// Run `op` on the task-state document inside the lock.
    ///
    /// The document is saved only when `op` succeeds and `save` is set.
    fn locked<T>(
        &self,
        action: &str,
        save: bool,
        op: impl FnOnce(&mut StateDocument) -> Result<T>,
    ) -> Result<T> {
        let mut lock = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());
        lock.set_action(action);

        let state_path = self.ctx.state_path();
        lock.with_exclusive(|| {
            let mut doc = load_or_new(&state_path, &self.config)?;
            let value = op(&mut doc)?;
            if save {
                doc.save(&state_path)?;
            }
            Ok(value)
        })
    }

    /// Read a consistent copy of the task-state document.
    pub fn snapshot(&self) -> Result<StateDocument> {
        self.locked("read", false, |doc| Ok(doc.clone()))
    }

    /// Create a task and notify `on_task_create` subscribers.
    pub fn create_task(&self, title: &str, tags: Vec<String>) -> Result<Task> {
        let task = self.locked("add", true, |doc| doc.add_task(title, tags))?;
        info!(task_id = %task.id, title = %task.title, "task created");

        self.plugins
            .dispatch(&WorkflowEvent::TaskCreate(task.clone()))?;
        Ok(task)
    }

    /// Move a task to `status`.
    ///
    /// Moving to `Done` goes through [`complete_task`](Self::complete_task)
    /// so completion hooks always fire.
    pub fn update_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        if status == TaskStatus::Done {
            return self.complete_task(id);
        }

        let task = self.locked(status.as_str(), true, |doc| doc.set_status(id, status))?;
        info!(task_id = %task.id, status = %task.status, "task status updated");
        Ok(task)
    }

    pub fn start_task(&self, id: &str) -> Result<Task> {
        self.update_status(id, TaskStatus::InProgress)
    }

    pub fn block_task(&self, id: &str) -> Result<Task> {
        self.update_status(id, TaskStatus::Blocked)
    }

    /// Mark a task done and notify `on_task_complete` subscribers.
    pub fn complete_task(&self, id: &str) -> Result<Task> {
        let task = self.locked("complete", true, |doc| doc.complete(id))?;
        info!(task_id = %task.id, "task completed");

        self.plugins
            .dispatch(&WorkflowEvent::TaskComplete(task.clone()))?;
        Ok(task)
    }

    /// Set the workflow state and notify `on_state_change` subscribers.
    ///
    /// Returns `(from, to)`, or `None` when the workflow was already in `to`
    /// (no event is dispatched then).
    pub fn transition(&self, to: &str) -> Result<Option<(String, String)>> {
        let change = self.locked("state", true, |doc| doc.set_workflow_state(to))?;

        match &change {
            Some((from, to)) => {
                info!(%from, %to, "workflow state changed");
                self.plugins.dispatch(&WorkflowEvent::StateChange {
                    from: from.clone(),
                    to: to.clone(),
                })?;
            }
            None => debug!(state = %to, "workflow already in requested state"),
        }

        Ok(change)
    }
}

fn load_or_new(state_path: &Path, config: &Config) -> Result<StateDocument> {
    if state_path.exists() {
        StateDocument::load(state_path)
    } else {
        debug!(path = %state_path.display(), "no task state yet, starting empty");
        Ok(StateDocument::new(&config.initial_state))
    }
}

/// Create the context directory, default config and empty task state.
///
/// Existing files are left untouched, so running it twice is harmless.
/// Returns `true` if anything was created.
pub fn init_project(ctx: &WorkflowContext, config: &Config) -> Result<bool> {
    let mut created = false;

    if !ctx.context_dir.exists() {
        std::fs::create_dir_all(&ctx.context_dir).map_err(|e| {
            CtxError::io(
                format!(
                    "failed to create context directory '{}'",
                    ctx.context_dir.display()
                ),
                e,
            )
        })?;
        created = true;
    }

    let config_path = ctx.config_path();
    if !config_path.exists() {
        crate::fs::atomic_write_file(&config_path, &config.to_yaml()?)?;
        created = true;
    }

    let state_path = ctx.state_path();
    let mut lock = FileLock::new(ctx.lock_path(), config.retry_policy()).with_action("init");
    created |= lock.with_exclusive(|| {
        if state_path.exists() {
            // Refuse to paper over a corrupt document with a fresh one.
            StateDocument::load(&state_path)?;
            return Ok(false);
        }
        StateDocument::new(&config.initial_state).save(&state_path)?;
        Ok(true)
    })?;

    if created {
        info!(path = %ctx.context_dir.display(), "project initialized");
    }
    Ok(created)
}
