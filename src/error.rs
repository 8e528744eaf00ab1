//! Error types used by the ticketvisor controller, its workers and collaborators.
//!
//! This module defines four enums:
//!
//! - [`ControllerError`] errors returned to callers of the controller surface.
//! - [`TaskError`] terminal outcomes of a task execution other than success.
//! - [`CallbackError`] failures of a single callback delivery (logged, never surfaced).
//! - [`RuntimeError`] failures of the controller runtime itself (shutdown).
//!
//! All types provide an `as_label` helper returning a short stable label for logs.
//!
//! "Ticket not found" is intentionally **not** an error: `status` and `cancel`
//! answer with an `unknown` / `accepted = false` reply instead.

use std::time::Duration;
use thiserror::Error;

/// # Errors returned by caller-facing controller operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The admission queue has a finite capacity and is full.
    #[error("admission rejected: queue is full (capacity {capacity})")]
    AdmissionRejected {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The controller has been shut down and no longer admits work.
    #[error("controller is shut down")]
    Closed,

    /// The configuration passed to the builder is not usable.
    #[error("invalid controller config: {reason}")]
    InvalidConfig {
        /// What is wrong with the config.
        reason: String,
    },
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use ticketvisor::ControllerError;
    ///
    /// let err = ControllerError::AdmissionRejected { capacity: 8 };
    /// assert_eq!(err.as_label(), "admission_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::AdmissionRejected { .. } => "admission_rejected",
            ControllerError::Closed => "controller_closed",
            ControllerError::InvalidConfig { .. } => "invalid_config",
        }
    }
}

/// # Non-success outcomes of a task execution.
///
/// Returned from [`Task::execute`](crate::Task::execute). Neither variant
/// reaches the controller as an error: the worker logs it and terminates.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// A checkpoint observed the cancellation token.
    #[error("aborted by signal")]
    Aborted,

    /// Task execution failed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Failed`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Aborted => "task_aborted",
            TaskError::Failed { .. } => "task_failed",
        }
    }

    /// True if the task stopped because of cooperative cancellation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, TaskError::Aborted)
    }
}

/// # Failures of callback delivery.
///
/// These never propagate to the submitting caller; the notifier logs them.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The target could not be reached.
    #[error("callback transport error: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// A single attempt exceeded its timeout.
    #[error("callback attempt timed out after {timeout:?}")]
    Timeout {
        /// Per-attempt timeout.
        timeout: Duration,
    },

    /// Every attempt failed.
    #[error("callback delivery failed after {attempts} attempts")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl CallbackError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Transport { .. } => "callback_transport",
            CallbackError::Timeout { .. } => "callback_timeout",
            CallbackError::Exhausted { .. } => "callback_exhausted",
        }
    }
}

/// # Errors produced by the controller runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some workers never reached a checkpoint.
    #[error("shutdown timeout {grace:?} exceeded; stuck tickets: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Tickets whose workers were still running.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use ticketvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
