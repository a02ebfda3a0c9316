//! Exit code constants for the ctxflow CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state, API misuse)
//! - 2: Plugin failure (hook or initialize failed)
//! - 3: Task state or filesystem failure
//! - 4: Lock acquisition timed out

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid state, or misuse of the lock/registry API.
pub const USER_ERROR: i32 = 1;

/// A plugin's hook or initializer returned an error.
pub const PLUGIN_FAILURE: i32 = 2;

/// Task state could not be read, parsed, or written.
pub const STATE_FAILURE: i32 = 3;

/// The task-state lock could not be acquired within the retry budget.
pub const LOCK_FAILURE: i32 = 4;
