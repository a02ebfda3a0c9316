//! Error types for ctxflow.
//!
//! Uses thiserror for derive macros. Lock contention, API misuse and
//! infrastructure faults are separate variants so callers can decide whether
//! to retry, fix their code, or alert someone.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ctxflow operations.
#[derive(Error, Debug)]
pub enum CtxError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// The lock stayed contended for the whole retry budget.
    #[error(
        "timed out waiting for lock '{}' after {attempts} attempts; another ctxflow process is still working",
        .path.display()
    )]
    LockTimeout { path: PathBuf, attempts: u32 },

    /// `acquire` was called on a handle that already holds its lock.
    #[error("lock '{}' is already held by this handle", .0.display())]
    AlreadyHeld(PathBuf),

    /// A plugin with the same id is already registered.
    #[error("plugin '{0}' is already registered")]
    DuplicateId(String),

    /// No plugin with the given id is registered.
    #[error("plugin '{0}' is not registered")]
    NotFound(String),

    /// A plugin hook returned an error during dispatch.
    #[error("plugin '{plugin_id}' failed in {hook}: {message}")]
    HookFailed {
        plugin_id: String,
        hook: String,
        message: String,
    },

    /// A plugin's initialize hook failed during registration.
    #[error("plugin '{plugin_id}' failed to initialize: {message}")]
    PluginInit { plugin_id: String, message: String },

    /// The task-state document is malformed or inconsistent.
    #[error("task state error: {0}")]
    StateError(String),

    /// Filesystem or OS failure, with the underlying cause preserved.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CtxError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CtxError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CtxError::UserError(_)
            | CtxError::AlreadyHeld(_)
            | CtxError::DuplicateId(_)
            | CtxError::NotFound(_) => exit_codes::USER_ERROR,
            CtxError::HookFailed { .. } | CtxError::PluginInit { .. } => {
                exit_codes::PLUGIN_FAILURE
            }
            CtxError::StateError(_) | CtxError::Io { .. } => exit_codes::STATE_FAILURE,
            CtxError::LockTimeout { .. } => exit_codes::LOCK_FAILURE,
        }
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Misuse errors are caller bugs and never become retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CtxError::LockTimeout { .. } | CtxError::Io { .. })
    }
}

/// Result type alias for ctxflow operations.
pub type Result<T> = std::result::Result<T, CtxError>;
