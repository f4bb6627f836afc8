//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a named, one-shot unit of work that is
//! consumed by the execution slot that dequeues it. The common implementation is
//! the closure-backed [`TaskFn`](crate::TaskFn).
//!
//! A task receives a [`TaskContext`] carrying its submission index and a
//! [`CancellationToken`](tokio_util::sync::CancellationToken); long-running tasks
//! should check the token to stop cooperatively when a close grace expires.

use std::future::Future;
use std::pin::Pin;

use crate::error::TaskError;
use crate::tasks::TaskContext;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture<R> = Pin<Box<dyn Future<Output = Result<R, TaskError>> + Send + 'static>>;

/// # One-shot unit of work.
///
/// A `Task` has a stable [`name`](Task::name) and is turned into a future exactly
/// once by [`spawn`](Task::spawn). The dispatcher calls `spawn` only after the task
/// was dequeued under a permit.
///
/// # Example
/// ```
/// use fanvisor::{Task, TaskContext, TaskError, BoxTaskFuture};
///
/// struct Lookup(u32);
///
/// impl Task for Lookup {
///     type Output = String;
///
///     fn name(&self) -> &str { "lookup" }
///
///     fn spawn(self, ctx: TaskContext) -> BoxTaskFuture<String> {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(format!("product-{}", self.0))
///         })
///     }
/// }
/// ```
pub trait Task: Send + 'static {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Consumes the task and creates the future that executes it.
    fn spawn(self, ctx: TaskContext) -> BoxTaskFuture<Self::Output>;
}
