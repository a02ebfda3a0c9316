//! Plugin registry and lifecycle hook dispatch.
//!
//! The engine knows nothing about concrete plugin types. A plugin is any
//! type implementing [`Plugin`]; every hook on the trait has a no-op
//! default, and a plugin lists the hook points it wants in
//! [`Plugin::registered_hooks`]. The [`PluginManager`] indexes plugins by
//! hook point and, for each [`WorkflowEvent`], calls the subscribers one at
//! a time in registration order.
//!
//! # Dispatch contract
//!
//! - Hooks run sequentially; each finishes before the next plugin starts.
//! - The first hook that returns an error stops the dispatch and the error
//!   propagates to the caller as `HookFailed`. Later plugins do not run for
//!   that event.
//! - Plugin code is never called while the registry's own lock is held, so
//!   hooks may call back into the registry or the engine.
//! - The engine dispatches after it has released the task-state lock.

mod hooks;
mod manager;
mod traits;

#[cfg(test)]
mod tests;

// Re-export public API
pub use hooks::{HookPoint, WorkflowEvent};
pub use manager::PluginManager;
pub use traits::{HookResult, Plugin, PluginManifest, ValidationResult};
