//! Filesystem utilities for ctxflow.
//!
//! The task-state document is replaced atomically so that readers outside
//! the lock never see a half-written file.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
