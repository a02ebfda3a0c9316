//! CLI argument parsing for ctxflow.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};

/// ctxflow: file-backed task tracking for AI-assisted development.
///
/// Task state lives in `.context/tasks.json`. Every change is made under a
/// cross-process lock, so several agents or terminals can work on the same
/// project at once.
#[derive(Parser, Debug)]
#[command(name = "ctxflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for ctxflow.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize ctxflow in the current directory.
    ///
    /// Creates `.context/` with a default config and an empty task state.
    /// Safe to run again; existing files are left alone.
    Init,

    /// Add a new task.
    Add(AddArgs),

    /// Mark a task as in progress.
    Start(TaskArgs),

    /// Mark a task as blocked.
    Block(TaskArgs),

    /// Mark a task as done.
    Done(TaskArgs),

    /// Show or change the workflow state.
    ///
    /// Without an argument prints the current state.
    State(StateArgs),

    /// List tasks with their status.
    List,

    /// Show who holds the task-state lock, if anyone.
    Lock,

    /// List registered plugins and run their self-checks.
    Plugins,

    /// Show recent entries from the event log.
    Log(LogArgs),
}

/// Arguments for the `add` command.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Title for the new task.
    pub title: String,

    /// Tags for categorization.
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
}

/// Arguments for commands that target one task.
#[derive(Parser, Debug)]
pub struct TaskArgs {
    /// Task ID (e.g., TASK-001, or just 1).
    pub task_id: String,
}

/// Arguments for the `state` command.
#[derive(Parser, Debug)]
pub struct StateArgs {
    /// New workflow state name.
    pub to: Option<String>,
}

/// Arguments for the `log` command.
#[derive(Parser, Debug)]
pub struct LogArgs {
    /// Number of most recent events to show.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
