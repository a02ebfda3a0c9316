//! Plugin manager: registration, engine binding and hook dispatch.

use super::hooks::{HookPoint, WorkflowEvent};
use super::traits::{Plugin, PluginManifest, ValidationResult};
use crate::engine::WorkflowEngine;
use crate::error::{CtxError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct Entry {
    plugin: Arc<dyn Plugin>,
    manifest: PluginManifest,
}

#[derive(Debug, Default)]
struct Registry {
    /// Plugin ID → entry.
    plugins: HashMap<String, Entry>,
    /// Plugin IDs in registration order.
    order: Vec<String>,
    /// Hook point → subscribed plugin IDs, in registration order.
    by_hook: HashMap<HookPoint, Vec<String>>,
}

impl Registry {
    fn remove(&mut self, id: &str) -> Option<Entry> {
        let entry = self.plugins.remove(id)?;
        self.order.retain(|existing| existing != id);
        for subscribers in self.by_hook.values_mut() {
            subscribers.retain(|existing| existing != id);
        }
        Some(entry)
    }

    fn ordered(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|id| self.plugins.get(id))
    }
}

/// Registry of plugins and dispatcher of lifecycle events.
///
/// All mutation finishes before any plugin code runs: the internal lock is
/// released before `initialize` or a hook is called.
#[derive(Debug, Default)]
pub struct PluginManager {
    registry: RwLock<Registry>,
    engine: RwLock<Option<Weak<WorkflowEngine>>>,
}

impl PluginManager {
    /// Creates a new empty plugin manager with no engine bound.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(|poison| poison.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Bind (or rebind) the engine passed to future `initialize` calls.
    ///
    /// Already-registered plugins are not initialized again.
    pub fn set_engine(&self, engine: Weak<WorkflowEngine>) {
        let mut slot = self.engine.write().unwrap_or_else(|poison| poison.into_inner());
        *slot = Some(engine);
    }

    /// The bound engine, if one is bound and still alive.
    pub fn engine(&self) -> Option<Arc<WorkflowEngine>> {
        let slot = self.engine.read().unwrap_or_else(|poison| poison.into_inner());
        slot.as_ref().and_then(Weak::upgrade)
    }

    /// Register a plugin.
    ///
    /// Fails with `DuplicateId` if the ID is taken, leaving the existing
    /// plugin untouched. When an engine is bound the plugin's `initialize`
    /// hook runs right after insertion; if it fails the plugin stays
    /// registered and `PluginInit` is returned. Call
    /// [`unregister`](Self::unregister) to roll back.
    ///
    /// Hook subscriptions come from [`Plugin::registered_hooks`] at this
    /// point; an `on_*` override missing from that list is never dispatched.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let manifest = plugin.manifest();
        let id = manifest.id.clone();
        if id.trim().is_empty() {
            return Err(CtxError::UserError(format!(
                "plugin '{}' has an empty id",
                manifest.name
            )));
        }

        {
            let mut registry = self.write();
            if registry.plugins.contains_key(&id) {
                return Err(CtxError::DuplicateId(id));
            }

            // Only declared hooks are indexed; undeclared overrides never run
            let mut hooks = plugin.registered_hooks();
            hooks.sort();
            hooks.dedup();
            for hook in hooks {
                registry.by_hook.entry(hook).or_default().push(id.clone());
            }
            registry.order.push(id.clone());
            registry.plugins.insert(
                id.clone(),
                Entry {
                    plugin: Arc::clone(&plugin),
                    manifest: manifest.clone(),
                },
            );
        }

        info!(plugin_id = %id, name = %manifest.name, version = %manifest.version, "plugin registered");

        if let Some(engine) = self.engine() {
            plugin.initialize(&engine).map_err(|message| {
                warn!(plugin_id = %id, error = %message, "plugin initialize failed");
                CtxError::PluginInit {
                    plugin_id: id.clone(),
                    message,
                }
            })?;
            debug!(plugin_id = %id, "plugin initialized");
        }

        Ok(())
    }

    /// Unregister a plugin by ID, returning it.
    pub fn unregister(&self, id: &str) -> Result<Arc<dyn Plugin>> {
        let entry = self
            .write()
            .remove(id)
            .ok_or_else(|| CtxError::NotFound(id.to_string()))?;

        info!(plugin_id = %id, "plugin unregistered");
        Ok(entry.plugin)
    }

    /// Gets a plugin by ID.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.read().plugins.get(id).map(|e| Arc::clone(&e.plugin))
    }

    /// All plugins in registration order.
    pub fn all(&self) -> Vec<Arc<dyn Plugin>> {
        self.read().ordered().map(|e| Arc::clone(&e.plugin)).collect()
    }

    /// Manifests captured at registration, in registration order.
    pub fn manifests(&self) -> Vec<PluginManifest> {
        self.read().ordered().map(|e| e.manifest.clone()).collect()
    }

    /// Checks whether a plugin is registered.
    pub fn has(&self, id: &str) -> bool {
        self.read().plugins.contains_key(id)
    }

    /// Returns plugin count.
    pub fn count(&self) -> usize {
        self.read().plugins.len()
    }

    /// Remove every plugin. No teardown hook is called.
    pub fn clear(&self) {
        let mut registry = self.write();
        let removed = registry.plugins.len();
        *registry = Registry::default();
        debug!(removed, "plugin registry cleared");
    }

    /// Run every plugin's self-check, in registration order.
    pub fn validate_all(&self) -> Vec<(String, ValidationResult)> {
        let snapshot: Vec<(String, Arc<dyn Plugin>)> = self
            .read()
            .ordered()
            .map(|e| (e.manifest.id.clone(), Arc::clone(&e.plugin)))
            .collect();

        snapshot
            .into_iter()
            .map(|(id, plugin)| (id, plugin.validate()))
            .collect()
    }

    /// Deliver an event to every subscribed plugin, in registration order.
    ///
    /// Stops at the first failing hook and returns `HookFailed`; plugins
    /// after it do not see the event.
    pub fn dispatch(&self, event: &WorkflowEvent) -> Result<()> {
        let hook = event.hook_point();
        let subscribers: Vec<(String, Arc<dyn Plugin>)> = {
            let registry = self.read();
            registry
                .by_hook
                .get(&hook)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| {
                            registry
                                .plugins
                                .get(id)
                                .map(|e| (id.clone(), Arc::clone(&e.plugin)))
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        if subscribers.is_empty() {
            return Ok(());
        }

        debug!(%hook, subscribers = subscribers.len(), task = ?event.task_id(), "dispatching hook");

        for (id, plugin) in subscribers {
            let outcome = match event {
                WorkflowEvent::StateChange { from, to } => plugin.on_state_change(from, to),
                WorkflowEvent::TaskCreate(task) => plugin.on_task_create(task),
                WorkflowEvent::TaskComplete(task) => plugin.on_task_complete(task),
            };

            if let Err(message) = outcome {
                warn!(%hook, plugin_id = %id, error = %message, "hook failed, stopping dispatch");
                return Err(CtxError::HookFailed {
                    plugin_id: id,
                    hook: hook.method_name().to_string(),
                    message,
                });
            }
        }

        Ok(())
    }
}
