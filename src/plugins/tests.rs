//! Tests for plugin registration and hook dispatch.

use super::*;
use crate::config::Config;
use crate::engine::WorkflowEngine;
use crate::error::CtxError;
use crate::task::{Task, TaskStatus};
use crate::test_support::create_test_project;
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// Shared call journal so ordering across plugins can be asserted.
type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Debug)]
struct Spy {
    id: &'static str,
    hooks: Vec<HookPoint>,
    journal: Journal,
    fail_on: Option<HookPoint>,
    fail_init: bool,
}

impl Spy {
    fn new(id: &'static str, hooks: &[HookPoint], journal: &Journal) -> Self {
        Self {
            id,
            hooks: hooks.to_vec(),
            journal: Arc::clone(journal),
            fail_on: None,
            fail_init: false,
        }
    }

    fn failing_on(mut self, hook: HookPoint) -> Self {
        self.fail_on = Some(hook);
        self
    }

    fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    fn log(&self, hook: HookPoint, detail: String) -> HookResult {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", self.id, hook, detail));
        if self.fail_on == Some(hook) {
            return Err(format!("{} refused", self.id));
        }
        Ok(())
    }
}

impl Plugin for Spy {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(self.id, &format!("Spy {}", self.id), "1.0.0")
    }

    fn registered_hooks(&self) -> Vec<HookPoint> {
        self.hooks.clone()
    }

    fn initialize(&self, _engine: &WorkflowEngine) -> HookResult {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:initialize", self.id));
        if self.fail_init {
            return Err("missing credentials".to_string());
        }
        Ok(())
    }

    fn on_state_change(&self, from: &str, to: &str) -> HookResult {
        self.log(HookPoint::StateChange, format!("{}->{}", from, to))
    }

    fn on_task_create(&self, task: &Task) -> HookResult {
        self.log(HookPoint::TaskCreate, task.id.clone())
    }

    fn on_task_complete(&self, task: &Task) -> HookResult {
        self.log(HookPoint::TaskComplete, task.id.clone())
    }

    fn validate(&self) -> ValidationResult {
        if self.id.starts_with("bad") {
            ValidationResult::invalid(vec![format!("{} is misconfigured", self.id)])
        } else {
            ValidationResult::ok()
        }
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

fn sample_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        title: "Sample".to_string(),
        status: TaskStatus::Pending,
        tags: Vec::new(),
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    }
}

#[test]
fn test_register_and_lookup() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("alpha", &[], &log)))
        .unwrap();
    manager
        .register(Arc::new(Spy::new("beta", &[], &log)))
        .unwrap();

    assert_eq!(manager.count(), 2);
    assert!(manager.has("alpha"));
    assert!(!manager.has("gamma"));
    assert_eq!(manager.get("beta").unwrap().manifest().id, "beta");
    assert!(manager.get("gamma").is_none());

    let ids: Vec<_> = manager.manifests().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["alpha", "beta"]);
    let all: Vec<_> = manager.all().iter().map(|p| p.manifest().id).collect();
    assert_eq!(all, vec!["alpha", "beta"]);
}

#[test]
fn test_duplicate_id_is_rejected_and_original_kept() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("audit", &[HookPoint::TaskCreate], &log)))
        .unwrap();

    let err = manager
        .register(Arc::new(Spy::new("audit", &[HookPoint::StateChange], &log)))
        .unwrap_err();
    assert!(matches!(err, CtxError::DuplicateId(ref id) if id == "audit"));
    assert_eq!(manager.count(), 1);

    // The original subscription is intact and the rejected one never landed
    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-001")))
        .unwrap();
    manager
        .dispatch(&WorkflowEvent::StateChange {
            from: "draft".to_string(),
            to: "active".to_string(),
        })
        .unwrap();
    assert_eq!(entries(&log), vec!["audit:on_task_create:TASK-001"]);
}

#[test]
fn test_empty_id_is_rejected() {
    let manager = PluginManager::new();
    let err = manager
        .register(Arc::new(Spy::new("  ", &[], &journal())))
        .unwrap_err();
    assert!(matches!(err, CtxError::UserError(_)));
    assert_eq!(manager.count(), 0);
}

#[test]
fn test_dispatch_reaches_only_subscribers_in_registration_order() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("zeta", &[HookPoint::TaskCreate], &log)))
        .unwrap();
    manager
        .register(Arc::new(Spy::new("quiet", &[], &log)))
        .unwrap();
    manager
        .register(Arc::new(Spy::new(
            "alpha",
            &[HookPoint::TaskCreate, HookPoint::TaskComplete],
            &log,
        )))
        .unwrap();

    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-007")))
        .unwrap();

    assert_eq!(
        entries(&log),
        vec!["zeta:on_task_create:TASK-007", "alpha:on_task_create:TASK-007"]
    );
}

#[test]
fn test_implemented_but_undeclared_hooks_never_run() {
    let manager = PluginManager::new();
    let log = journal();
    // Spy overrides every on_* method but subscribes to nothing
    manager
        .register(Arc::new(Spy::new("silent", &[], &log)))
        .unwrap();

    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-001")))
        .unwrap();
    manager
        .dispatch(&WorkflowEvent::TaskComplete(sample_task("TASK-001")))
        .unwrap();
    manager
        .dispatch(&WorkflowEvent::StateChange {
            from: "draft".to_string(),
            to: "active".to_string(),
        })
        .unwrap();

    assert!(entries(&log).is_empty());
}

#[test]
fn test_state_change_reaches_only_declared_subscriber() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("a", &[], &log)))
        .unwrap();
    manager
        .register(Arc::new(Spy::new("b", &[HookPoint::StateChange], &log)))
        .unwrap();

    manager
        .dispatch(&WorkflowEvent::StateChange {
            from: "draft".to_string(),
            to: "active".to_string(),
        })
        .unwrap();

    assert_eq!(entries(&log), vec!["b:on_state_change:draft->active"]);
}

#[test]
fn test_duplicate_hook_declarations_dispatch_once() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new(
            "twice",
            &[HookPoint::TaskComplete, HookPoint::TaskComplete],
            &log,
        )))
        .unwrap();

    manager
        .dispatch(&WorkflowEvent::TaskComplete(sample_task("TASK-002")))
        .unwrap();
    assert_eq!(entries(&log).len(), 1);
}

#[test]
fn test_dispatch_without_subscribers_is_ok() {
    let manager = PluginManager::new();
    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-001")))
        .unwrap();
}

#[test]
fn test_first_failing_hook_stops_dispatch() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("first", &[HookPoint::TaskComplete], &log)))
        .unwrap();
    manager
        .register(Arc::new(
            Spy::new("second", &[HookPoint::TaskComplete], &log)
                .failing_on(HookPoint::TaskComplete),
        ))
        .unwrap();
    manager
        .register(Arc::new(Spy::new("third", &[HookPoint::TaskComplete], &log)))
        .unwrap();

    let err = manager
        .dispatch(&WorkflowEvent::TaskComplete(sample_task("TASK-003")))
        .unwrap_err();

    match err {
        CtxError::HookFailed {
            plugin_id,
            hook,
            message,
        } => {
            assert_eq!(plugin_id, "second");
            assert_eq!(hook, "on_task_complete");
            assert_eq!(message, "second refused");
        }
        other => panic!("expected HookFailed, got {:?}", other),
    }
    assert_eq!(
        entries(&log),
        vec![
            "first:on_task_complete:TASK-003",
            "second:on_task_complete:TASK-003"
        ]
    );
}

#[test]
fn test_unregister_removes_subscriptions() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("audit", &[HookPoint::TaskCreate], &log)))
        .unwrap();

    let removed = manager.unregister("audit").unwrap();
    assert_eq!(removed.manifest().id, "audit");
    assert!(!manager.has("audit"));

    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-001")))
        .unwrap();
    assert!(entries(&log).is_empty());

    // The id is free again
    manager
        .register(Arc::new(Spy::new("audit", &[], &log)))
        .unwrap();
}

#[test]
fn test_unregister_unknown_id_is_not_found() {
    let manager = PluginManager::new();
    let err = manager.unregister("ghost").unwrap_err();
    assert!(matches!(err, CtxError::NotFound(ref id) if id == "ghost"));
}

#[test]
fn test_clear_empties_registry() {
    let manager = PluginManager::new();
    let log = journal();
    for id in ["a", "b", "c"] {
        manager
            .register(Arc::new(Spy::new(id, &HookPoint::ALL, &log)))
            .unwrap();
    }

    manager.clear();

    assert_eq!(manager.count(), 0);
    assert!(manager.manifests().is_empty());
    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-001")))
        .unwrap();
    assert!(entries(&log).is_empty());
}

#[test]
fn test_initialize_only_runs_with_bound_engine() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("unbound", &[], &log)))
        .unwrap();
    assert!(entries(&log).is_empty());

    let (_temp_dir, ctx) = create_test_project();
    let engine = WorkflowEngine::new(ctx, Config::default());
    engine
        .plugins()
        .register(Arc::new(Spy::new("bound", &[], &log)))
        .unwrap();
    assert_eq!(entries(&log), vec!["bound:initialize"]);
}

#[test]
fn test_set_engine_does_not_reinitialize_existing_plugins() {
    let (_temp_dir, ctx) = create_test_project();
    let engine = WorkflowEngine::new(ctx, Config::default());
    let manager = PluginManager::new();
    let log = journal();

    manager
        .register(Arc::new(Spy::new("early", &[], &log)))
        .unwrap();
    manager.set_engine(engine.handle());
    assert!(manager.engine().is_some());
    manager
        .register(Arc::new(Spy::new("late", &[], &log)))
        .unwrap();

    assert_eq!(entries(&log), vec!["late:initialize"]);
}

#[test]
fn test_dropped_engine_skips_initialize() {
    let (_temp_dir, ctx) = create_test_project();
    let manager = PluginManager::new();
    let log = journal();
    {
        let engine = WorkflowEngine::new(ctx, Config::default());
        manager.set_engine(engine.handle());
    }

    assert!(manager.engine().is_none());
    manager
        .register(Arc::new(Spy::new("orphan", &[], &log)))
        .unwrap();
    assert!(entries(&log).is_empty());
}

#[test]
fn test_failed_initialize_keeps_plugin_registered() {
    let (_temp_dir, ctx) = create_test_project();
    let engine = WorkflowEngine::new(ctx, Config::default());
    let log = journal();

    let err = engine
        .plugins()
        .register(Arc::new(
            Spy::new("webhook", &[HookPoint::TaskCreate], &log).failing_init(),
        ))
        .unwrap_err();

    match err {
        CtxError::PluginInit { plugin_id, message } => {
            assert_eq!(plugin_id, "webhook");
            assert_eq!(message, "missing credentials");
        }
        other => panic!("expected PluginInit, got {:?}", other),
    }
    assert!(engine.plugins().has("webhook"));

    // Callers roll back explicitly
    engine.plugins().unregister("webhook").unwrap();
    assert_eq!(engine.plugins().count(), 0);
}

#[test]
fn test_validate_all_in_registration_order() {
    let manager = PluginManager::new();
    let log = journal();
    manager
        .register(Arc::new(Spy::new("good", &[], &log)))
        .unwrap();
    manager
        .register(Arc::new(Spy::new("bad-config", &[], &log)))
        .unwrap();

    let results = manager.validate_all();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "good");
    assert!(results[0].1.valid);
    assert_eq!(results[1].0, "bad-config");
    assert!(!results[1].1.valid);
    assert_eq!(results[1].1.errors, vec!["bad-config is misconfigured"]);
}

#[test]
fn test_hook_may_reenter_registry() {
    #[derive(Debug)]
    struct SelfRemoving {
        manager: Arc<PluginManager>,
    }

    impl Plugin for SelfRemoving {
        fn manifest(&self) -> PluginManifest {
            PluginManifest::new("once", "Run once", "0.1.0")
        }

        fn registered_hooks(&self) -> Vec<HookPoint> {
            vec![HookPoint::TaskCreate]
        }

        fn on_task_create(&self, _task: &Task) -> HookResult {
            self.manager.unregister("once").map(|_| ()).map_err(|e| e.to_string())
        }
    }

    let manager = Arc::new(PluginManager::new());
    manager
        .register(Arc::new(SelfRemoving {
            manager: Arc::clone(&manager),
        }))
        .unwrap();

    manager
        .dispatch(&WorkflowEvent::TaskCreate(sample_task("TASK-001")))
        .unwrap();
    assert_eq!(manager.count(), 0);
}

#[test]
fn test_hook_point_names() {
    assert_eq!(HookPoint::StateChange.to_string(), "on_state_change");
    assert_eq!(HookPoint::TaskCreate.method_name(), "on_task_create");
    assert_eq!(
        serde_json::to_string(&HookPoint::TaskComplete).unwrap(),
        "\"task_complete\""
    );

    let event = WorkflowEvent::TaskComplete(sample_task("TASK-009"));
    assert_eq!(event.hook_point(), HookPoint::TaskComplete);
    assert_eq!(event.task_id(), Some("TASK-009"));
}

#[test]
fn test_manifest_display() {
    let manifest = PluginManifest::new("event-log", "Event log", "0.1.0");
    assert_eq!(manifest.to_string(), "event-log (Event log v0.1.0)");
}
