//! Cross-process locking for the task-state document.
//!
//! A single advisory lock guards `.context/tasks.json`. Every writer must
//! go through [`ExclusiveLock::with_exclusive`] so that CLI invocations,
//! background hooks and parallel test workers never interleave their
//! read-modify-write cycles.
//!
//! # Lock Artifact
//!
//! The lock is an OS advisory file lock (`flock` on Unix, `LockFileEx` on
//! Windows) taken on `.context/tasks.lock`. The directory and the file are
//! created on the first acquisition attempt. The file is never deleted: a
//! waiter may already hold a descriptor to it, and the OS drops the lock
//! when the holder exits, so crashed holders leave nothing to clean up.
//!
//! # Lock Metadata
//!
//! While held, the artifact contains JSON metadata:
//! - `owner`: `user@HOST`
//! - `pid`: The process ID
//! - `created_at`: RFC3339 timestamp
//! - `action`: What the holder is doing (add/complete/state/etc.)
//!
//! The metadata is informational only; whether the lock is held is decided
//! by probing the OS lock ([`inspect_lock`]).
//!
//! # Contention
//!
//! Acquisition retries with bounded exponential backoff ([`RetryPolicy`])
//! and fails with `LockTimeout` once the budget is spent. Calling `acquire`
//! on a handle that already holds its lock fails at once with `AlreadyHeld`.

mod exclusive;
mod file_lock;
mod guard;
mod inspect;
mod metadata;
mod retry;


// Re-export public API
pub use exclusive::ExclusiveLock;
pub use file_lock::FileLock;
pub use guard::ReleaseOnDrop;
pub use inspect::{LockStatus, inspect_lock};
pub use metadata::{LockMetadata, get_owner_string};
pub use retry::RetryPolicy;
