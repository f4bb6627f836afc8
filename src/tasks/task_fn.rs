//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnOnce(TaskContext) -> Fut`. The closure owns its
//! captured state and is called once, by the execution slot that dequeues it.
//! If tasks need to share state, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use fanvisor::{Task, TaskContext, TaskError, TaskFn};
//!
//! let t = TaskFn::new("worker", |ctx: TaskContext| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok::<_, TaskError>(ctx.seq() * 2)
//! });
//!
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;

use crate::error::TaskError;
use crate::tasks::TaskContext;
use crate::tasks::task::{BoxTaskFuture, Task};

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F, Fut, R> Task for TaskFn<F>
where
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
    R: Send + 'static,
{
    type Output = R;

    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self, ctx: TaskContext) -> BoxTaskFuture<R> {
        Box::pin((self.f)(ctx))
    }
}
