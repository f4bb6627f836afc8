//! # Per-task execution context.
//!
//! [`TaskContext`] is the immutable value handed to a task when its execution slot
//! starts it. Anything a task needs to know about *this* execution travels here
//! explicitly, never through globals or thread-locals, so nothing leaks between
//! unrelated concurrent tasks.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Immutable execution context of one task.
///
/// - `seq`: submission index (0-based, assigned when the task was queued)
/// - `ordinal`: start index (0-based, assigned when the task was dequeued)
///
/// Because dequeue is strictly FIFO, `ordinal == seq` for every task of a dispatcher.
#[derive(Clone, Debug)]
pub struct TaskContext {
    seq: u64,
    ordinal: u64,
    name: Arc<str>,
    token: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(seq: u64, ordinal: u64, name: Arc<str>, token: CancellationToken) -> Self {
        Self {
            seq,
            ordinal,
            name,
            token,
        }
    }

    /// Submission index of this task.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Position of this task in the dispatcher's start order.
    #[inline]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Task name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancellation token, cancelled when a close grace period expires.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Shorthand for `token().is_cancelled()`.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the task is asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
