use crate::config::Config;
use crate::context::WorkflowContext;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Create an initialized project in a temp directory.
pub(crate) fn create_test_project() -> (TempDir, WorkflowContext) {
    let temp_dir = TempDir::new().unwrap();
    let ctx = WorkflowContext::at(temp_dir.path());
    crate::engine::init_project(&ctx, &Config::default()).unwrap();
    (temp_dir, ctx)
}

/// Config with a short lock budget so contention tests finish quickly.
pub(crate) fn fast_lock_config() -> Config {
    let mut config = Config::default();
    config.lock.retries = 5;
    config.lock.min_backoff_ms = 10;
    config.lock.max_backoff_ms = 40;
    config.event_log = false;
    config
}

/// Total wait budget implied by [`fast_lock_config`], for timing assertions.
pub(crate) fn fast_lock_budget() -> Duration {
    fast_lock_config().retry_policy().total_budget()
}
