//! Read-only probing of a lock artifact.

use super::metadata::LockMetadata;
use crate::error::{CtxError, Result};
use std::fmt;
use std::fs::{self, File, TryLockError};
use std::path::Path;

/// Observed state of a lock artifact.
#[derive(Debug, Clone)]
pub enum LockStatus {
    /// The artifact has never been created.
    Missing,
    /// Nobody holds the lock.
    Free,
    /// Some handle holds the lock. Metadata is `None` when the holder has
    /// not written it yet or it could not be parsed.
    Held(Option<LockMetadata>),
}

impl LockStatus {
    pub fn is_held(&self) -> bool {
        matches!(self, LockStatus::Held(_))
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockStatus::Missing => write!(f, "never acquired"),
            LockStatus::Free => write!(f, "free"),
            LockStatus::Held(None) => write!(f, "held (no metadata)"),
            LockStatus::Held(Some(meta)) => write!(
                f,
                "held by {} (pid {}, age {}, action: {})",
                meta.owner,
                meta.pid.map_or_else(|| "?".to_string(), |p| p.to_string()),
                meta.age_string(),
                meta.action
            ),
        }
    }
}

/// Check the lock at `path` without waiting.
///
/// A momentary lock is taken and released when the artifact is free, so
/// the check itself can race with a real acquirer; the answer is advisory.
pub fn inspect_lock(path: &Path) -> Result<LockStatus> {
    if !path.exists() {
        return Ok(LockStatus::Missing);
    }

    let file = File::open(path)
        .map_err(|e| CtxError::io(format!("failed to open lock file '{}'", path.display()), e))?;

    match file.try_lock_shared() {
        Ok(()) => {
            let _ = file.unlock();
            Ok(LockStatus::Free)
        }
        Err(TryLockError::WouldBlock) => {
            let metadata = fs::read_to_string(path)
                .ok()
                .and_then(|content| LockMetadata::parse(&content).ok().flatten());
            Ok(LockStatus::Held(metadata))
        }
        Err(TryLockError::Error(e)) => Err(CtxError::io(
            format!("failed to inspect lock '{}'", path.display()),
            e,
        )),
    }
}
