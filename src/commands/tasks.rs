//! Task and workflow-state commands: `add`, `start`, `block`, `done`,
//! `state` and `list`.

use super::{open_engine, parse_task_id};
use crate::cli::{AddArgs, StateArgs, TaskArgs};
use ctxflow::context::WorkflowContext;
use ctxflow::error::Result;
use ctxflow::task::Task;

pub fn cmd_add(ctx: &WorkflowContext, args: AddArgs) -> Result<()> {
    let engine = open_engine(ctx)?;
    let task = engine.create_task(&args.title, args.tags)?;
    println!("Created {}: {}", task.id, task.title);
    Ok(())
}

pub fn cmd_start(ctx: &WorkflowContext, args: TaskArgs) -> Result<()> {
    let id = parse_task_id(&args.task_id)?;
    let task = open_engine(ctx)?.start_task(&id)?;
    println!("{} is now {}", task.id, task.status);
    Ok(())
}

pub fn cmd_block(ctx: &WorkflowContext, args: TaskArgs) -> Result<()> {
    let id = parse_task_id(&args.task_id)?;
    let task = open_engine(ctx)?.block_task(&id)?;
    println!("{} is now {}", task.id, task.status);
    Ok(())
}

pub fn cmd_done(ctx: &WorkflowContext, args: TaskArgs) -> Result<()> {
    let id = parse_task_id(&args.task_id)?;
    let task = open_engine(ctx)?.complete_task(&id)?;
    println!("{} is now {}", task.id, task.status);
    Ok(())
}

pub fn cmd_state(ctx: &WorkflowContext, args: StateArgs) -> Result<()> {
    let engine = open_engine(ctx)?;

    let Some(to) = args.to else {
        println!("{}", engine.snapshot()?.workflow_state);
        return Ok(());
    };

    match engine.transition(&to)? {
        Some((from, to)) => println!("Workflow state: {} -> {}", from, to),
        None => println!("Workflow state is already '{}'", to.trim()),
    }
    Ok(())
}

pub fn cmd_list(ctx: &WorkflowContext) -> Result<()> {
    let doc = open_engine(ctx)?.snapshot()?;

    println!("Workflow state: {}", doc.workflow_state);
    if doc.tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    println!();
    for task in &doc.tasks {
        println!("{}", format_task_line(task));
    }

    let summary: Vec<String> = doc
        .status_counts()
        .into_iter()
        .map(|(status, count)| format!("{} {}", count, status))
        .collect();
    println!();
    println!("{} task(s): {}", doc.tasks.len(), summary.join(", "));

    Ok(())
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!("  {:<10} {:<12} {}", task.id, task.status.as_str(), task.title);
    if !task.tags.is_empty() {
        line.push_str(&format!("  [{}]", task.tags.join(", ")));
    }
    line
}
