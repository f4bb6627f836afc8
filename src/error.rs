//! Error types used by the fanvisor runtime, its tasks and branches.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`] — errors raised by the dispatcher itself (configuration, shutdown).
//! - [`TaskError`] — errors raised by a single task execution or branch call.
//! - [`SubmitError`] — errors raised synchronously by [`Dispatcher::submit`](crate::Dispatcher::submit).
//!
//! `RuntimeError` and `TaskError` provide helper methods (`as_label`, `as_message`)
//! for logging/metrics.

use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the fanvisor runtime.
///
/// These represent failures of the dispatch machinery itself,
/// never of an individual task.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration rejected at construction time.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: &'static str,
    },

    /// Constructed outside a tokio runtime; there is nothing to spawn tasks on.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// Close grace period was exceeded; some tasks were still executing and got cancelled.
    #[error("close timeout {grace:?} exceeded; stuck: {stuck:?}; cancelling")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks that were still executing.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::NoRuntime => "runtime_missing",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("invalid config: {reason}"),
            RuntimeError::NoRuntime => "no tokio runtime".to_string(),
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}

/// # Errors produced by task execution.
///
/// Attached to a task's [`PendingResult`](crate::PendingResult) by the dispatcher,
/// or handed to a branch's fallback function by the aggregator.
/// A `TaskError` never escapes into the dispatcher loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task's own logic reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A branch call did not finish before its deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The task panicked; the panic was caught and its permit returned.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Task was cancelled before or during execution (grace exceeded on close).
    #[error("context cancelled")]
    Canceled,

    /// The runtime dropped the task before it could resolve its handle.
    #[error("task abandoned before completion")]
    Abandoned,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use fanvisor::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
            TaskError::Abandoned => "task_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Canceled => "context cancelled".to_string(),
            TaskError::Abandoned => "abandoned".to_string(),
        }
    }

    /// True if the error comes from a deadline rather than from the call itself.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

/// Error returned by [`Dispatcher::submit`](crate::Dispatcher::submit).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The dispatcher was closed; no permit or queue slot was allocated.
    #[error("dispatcher closed")]
    Closed,
}
