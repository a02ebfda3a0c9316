//! RAII release guard.

use super::exclusive::ExclusiveLock;

/// Releases the borrowed lock when dropped.
///
/// Used by `with_exclusive` so that an unwinding panic inside the critical
/// section still clears the handle's held state.
#[derive(Debug)]
pub struct ReleaseOnDrop<'a, L: ExclusiveLock + ?Sized> {
    lock: &'a mut L,
}

impl<'a, L: ExclusiveLock + ?Sized> ReleaseOnDrop<'a, L> {
    /// Wrap a lock the caller has already acquired.
    pub fn new(lock: &'a mut L) -> Self {
        Self { lock }
    }
}

impl<L: ExclusiveLock + ?Sized> Drop for ReleaseOnDrop<'_, L> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
