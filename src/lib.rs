//! ctxflow: file-backed task tracking for AI-assisted development.
//!
//! Task state lives in a single JSON document under `.context/`. Every
//! writer goes through a cross-process advisory lock ([`locks`]), and
//! lifecycle events are broadcast to registered plugins ([`plugins`]) once
//! the lock has been released. [`engine::WorkflowEngine`] ties the two
//! together.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod plugins;
pub mod task;

#[cfg(test)]
pub(crate) mod test_support;
