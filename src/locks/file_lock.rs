//! Lock handle backed by an OS advisory file lock.

use super::exclusive::ExclusiveLock;
use super::metadata::LockMetadata;
use super::retry::RetryPolicy;
use crate::error::{CtxError, Result};
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

/// Release capability for a held lock. Closing the descriptor also drops the
/// OS lock, so a token leaked through a panic cannot wedge other processes.
#[derive(Debug)]
struct HeldToken {
    file: File,
}

/// A lock handle bound to one lock artifact.
///
/// Each handle opens its own descriptor, so two handles on the same path
/// exclude each other even inside one process. A single handle is not meant
/// to be shared between threads; wrap it in a `Mutex` or create one handle
/// per thread.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    policy: RetryPolicy,
    action: String,
    held: Option<HeldToken>,
}

impl FileLock {
    /// Create a handle for the lock artifact at `path`. Nothing touches the
    /// filesystem until the first `acquire`.
    pub fn new(path: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            action: "unspecified".to_string(),
            held: None,
        }
    }

    /// Set the action name recorded in lock metadata by later acquisitions.
    pub fn with_action(mut self, action: &str) -> Self {
        self.action = action.to_string();
        self
    }

    /// Change the action name recorded by later acquisitions.
    pub fn set_action(&mut self, action: &str) {
        self.action = action.to_string();
    }

    /// Path to the lock artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The retry policy used on contention.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Record who holds the lock. Metadata is informational, so failing to
    /// write it does not give the lock back.
    fn write_metadata(&self, file: &File) {
        let result = LockMetadata::new(&self.action).to_json().and_then(|json| {
            file.set_len(0)
                .and_then(|()| {
                    let mut writer = file;
                    writer.write_all(json.as_bytes())
                })
                .map_err(|e| CtxError::io("failed to write lock metadata", e))
        });

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "lock acquired without metadata");
        }
    }
}

/// Create the lock directory if needed and open the artifact, creating it
/// empty when absent. Existing contents are left alone: another process may
/// be holding the lock and its metadata must survive our open.
fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CtxError::io(
                format!("failed to create lock directory '{}'", parent.display()),
                e,
            )
        })?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| CtxError::io(format!("failed to open lock file '{}'", path.display()), e))
}

#[cfg(not(test))]
fn unlock_file(file: &File) -> std::io::Result<()> {
    file.unlock()
}

#[cfg(test)]
thread_local! {
    static FAIL_UNLOCK: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Make `release` on this thread see an unlock error until reset.
#[cfg(test)]
pub(super) fn set_unlock_failure(enabled: bool) {
    FAIL_UNLOCK.with(|flag| flag.set(enabled));
}

#[cfg(test)]
fn unlock_file(file: &File) -> std::io::Result<()> {
    if FAIL_UNLOCK.with(|flag| flag.get()) {
        return Err(std::io::Error::other("simulated unlock failure"));
    }
    file.unlock()
}

impl ExclusiveLock for FileLock {
    fn acquire(&mut self) -> Result<()> {
        if self.held.is_some() {
            return Err(CtxError::AlreadyHeld(self.path.clone()));
        }

        let file = open_lock_file(&self.path)?;
        let max_attempts = self.policy.max_attempts();

        for attempt in 0..max_attempts {
            match file.try_lock() {
                Ok(()) => {
                    debug!(
                        path = %self.path.display(),
                        action = %self.action,
                        attempt = attempt + 1,
                        "lock acquired"
                    );
                    self.write_metadata(&file);
                    self.held = Some(HeldToken { file });
                    return Ok(());
                }
                Err(TryLockError::WouldBlock) => {
                    if attempt + 1 == max_attempts {
                        break;
                    }
                    let delay = self.policy.delay(attempt);
                    debug!(
                        path = %self.path.display(),
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "lock contended, backing off"
                    );
                    thread::sleep(delay);
                }
                Err(TryLockError::Error(e)) => {
                    return Err(CtxError::io(
                        format!("failed to lock '{}'", self.path.display()),
                        e,
                    ));
                }
            }
        }

        warn!(
            path = %self.path.display(),
            attempts = max_attempts,
            "gave up waiting for lock"
        );
        Err(CtxError::LockTimeout {
            path: self.path.clone(),
            attempts: max_attempts,
        })
    }

    fn release(&mut self) {
        // Take the token first: whatever happens below, this handle no
        // longer believes it holds the lock.
        let Some(token) = self.held.take() else {
            return;
        };

        if let Err(e) = token.file.set_len(0) {
            debug!(path = %self.path.display(), error = %e, "failed to clear lock metadata");
        }

        match unlock_file(&token.file) {
            Ok(()) => debug!(path = %self.path.display(), "lock released"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release lock; it will be dropped when the file closes"
            ),
        }
    }

    fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        self.release();
    }
}
