//! Command implementations for ctxflow.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Handlers are thin: they resolve the project, open the
//! engine, call one operation and print the result. Locking and hook
//! dispatch happen inside the engine.

mod init;
mod inspect;
mod tasks;

use crate::cli::Command;
use ctxflow::config::Config;
use ctxflow::context::{WorkflowContext, require_initialized};
use ctxflow::engine::WorkflowEngine;
use ctxflow::error::{CtxError, Result};
use ctxflow::task::normalize_task_id;
use std::sync::Arc;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(&WorkflowContext::resolve()?),
        Command::Add(args) => tasks::cmd_add(&require_initialized()?, args),
        Command::Start(args) => tasks::cmd_start(&require_initialized()?, args),
        Command::Block(args) => tasks::cmd_block(&require_initialized()?, args),
        Command::Done(args) => tasks::cmd_done(&require_initialized()?, args),
        Command::State(args) => tasks::cmd_state(&require_initialized()?, args),
        Command::List => tasks::cmd_list(&require_initialized()?),
        Command::Lock => inspect::cmd_lock(&require_initialized()?),
        Command::Plugins => inspect::cmd_plugins(&require_initialized()?),
        Command::Log(args) => inspect::cmd_log(&require_initialized()?, args),
    }
}

/// Load the project config and open the engine with built-in plugins.
fn open_engine(ctx: &WorkflowContext) -> Result<Arc<WorkflowEngine>> {
    let config = Config::load_or_default(ctx.config_path())?;
    WorkflowEngine::open(ctx.clone(), config)
}

/// Turn user input like `7` or `task-7` into a canonical task ID.
fn parse_task_id(input: &str) -> Result<String> {
    normalize_task_id(input).ok_or_else(|| {
        CtxError::UserError(format!(
            "invalid task ID '{}'. Expected something like TASK-001 or 1",
            input
        ))
    })
}
