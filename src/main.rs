//! ctxflow: file-backed task tracking for AI-assisted development.
//!
//! This is the main entry point for the `ctxflow` CLI. It installs logging,
//! parses arguments, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use ctxflow::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Environment variable checked before `RUST_LOG`.
const LOG_ENV: &str = "CTXFLOW_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("ctxflow=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);
            if err.is_retryable() {
                eprintln!("This may be temporary; try again shortly.");
            }

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
