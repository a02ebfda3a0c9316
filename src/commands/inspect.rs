//! Read-only diagnostics: `lock`, `plugins` and `log`.

use super::open_engine;
use crate::cli::LogArgs;
use ctxflow::context::WorkflowContext;
use ctxflow::error::Result;
use ctxflow::events::read_events;
use ctxflow::locks::{LockStatus, inspect_lock};

pub fn cmd_lock(ctx: &WorkflowContext) -> Result<()> {
    let path = ctx.lock_path();
    let status = inspect_lock(&path)?;

    println!("Lock:   {}", path.display());
    println!("Status: {}", status);

    if let LockStatus::Held(Some(meta)) = &status {
        println!(
            "Since:  {}",
            meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}

pub fn cmd_plugins(ctx: &WorkflowContext) -> Result<()> {
    let engine = open_engine(ctx)?;
    let plugins = engine.plugins();

    let manifests = plugins.manifests();
    if manifests.is_empty() {
        println!("No plugins registered.");
        return Ok(());
    }

    let results = plugins.validate_all();
    println!("Plugins ({}):", manifests.len());
    for (manifest, (_, result)) in manifests.iter().zip(&results) {
        let verdict = if result.valid { "ok" } else { "INVALID" };
        println!("  {} [{}]", manifest, verdict);
        for error in &result.errors {
            println!("    error:   {}", error);
        }
        for warning in &result.warnings {
            println!("    warning: {}", warning);
        }
    }

    Ok(())
}

pub fn cmd_log(ctx: &WorkflowContext, args: LogArgs) -> Result<()> {
    let events = read_events(&ctx.events_file())?;
    if events.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let skip = events.len().saturating_sub(args.limit);
    for event in &events[skip..] {
        println!(
            "{}  {:<16} {:<10} {}",
            event.ts.format("%Y-%m-%d %H:%M:%S"),
            event.hook.method_name(),
            event.task.as_deref().unwrap_or("-"),
            event.actor
        );
    }

    Ok(())
}
