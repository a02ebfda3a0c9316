//! The lock abstraction callers program against.

use super::guard::ReleaseOnDrop;
use crate::error::Result;

/// An exclusive, cross-process lock on one shared resource.
///
/// Implementations are not reentrant: a handle that already holds its lock
/// must reject a second `acquire` with `AlreadyHeld`. Independent handles
/// bound to the same resource exclude each other.
pub trait ExclusiveLock {
    /// Obtain the lock, retrying on contention.
    fn acquire(&mut self) -> Result<()>;

    /// Release the lock if held. Never fails; underlying errors are logged.
    fn release(&mut self);

    /// Whether this handle currently holds the lock.
    fn is_held(&self) -> bool;

    /// Run `op` while holding the lock.
    ///
    /// The lock is released on every exit path, including when `op` returns
    /// an error or panics, before the outcome is handed back.
    fn with_exclusive<T, F>(&mut self, op: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce() -> Result<T>,
    {
        self.acquire()?;
        let guard = ReleaseOnDrop::new(self);
        let outcome = op();
        drop(guard);
        outcome
    }
}
