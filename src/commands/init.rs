//! Implementation of the `ctxflow init` command.
//!
//! Creates `.context/` with a default `config.yaml` and an empty
//! `tasks.json`. Idempotent: existing files are never overwritten, and a
//! corrupt existing state file is reported rather than replaced.

use ctxflow::config::Config;
use ctxflow::context::WorkflowContext;
use ctxflow::engine::init_project;
use ctxflow::error::Result;

/// Execute the `ctxflow init` command.
pub fn cmd_init(ctx: &WorkflowContext) -> Result<()> {
    // An existing config (possibly hand-edited) decides the initial state.
    let config = Config::load_or_default(ctx.config_path())?;

    if init_project(ctx, &config)? {
        println!("Initialized ctxflow in {}", ctx.context_dir.display());
    } else {
        println!(
            "ctxflow is already initialized in {}",
            ctx.context_dir.display()
        );
    }

    Ok(())
}
