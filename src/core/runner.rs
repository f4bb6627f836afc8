//! # Run a single task execution.
//!
//! Executes one [`Task`] with panic isolation and turns its outcome into the
//! `Result` attached to its handle.
//!
//! ## Outcome mapping
//! ```text
//! token already cancelled  → Err(Canceled)       (task body never runs)
//! task.spawn() → Ok(v)     → Ok(v)
//! task.spawn() → Err(e)    → Err(e)
//! task panics              → Err(Panicked{info})
//! ```
//!
//! ## Rules
//! - Never unwinds into the caller: the drain step and its permit guard stay intact.
//! - The task is consumed (one-shot).

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    error::TaskError,
    tasks::{Task, TaskContext},
};

/// Executes `task` once, catching panics raised while creating or polling its future.
pub(crate) async fn run_once<T: Task>(task: T, ctx: TaskContext) -> Result<T::Output, TaskError> {
    if ctx.is_cancelled() {
        return Err(TaskError::Canceled);
    }

    let name = ctx.name().to_string();
    match AssertUnwindSafe(async move { task.spawn(ctx).await })
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(payload) => {
            let info = panic_message(payload);
            tracing::warn!(task = %name, panic = %info, "task panicked; permit released");
            Err(TaskError::Panicked { info })
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskFn;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn ctx(token: CancellationToken) -> TaskContext {
        TaskContext::new(0, 0, Arc::from("t"), token)
    }

    #[tokio::test]
    async fn value_passes_through() {
        let task = TaskFn::new("t", |_ctx: TaskContext| async { Ok::<_, TaskError>(5) });
        assert_eq!(run_once(task, ctx(CancellationToken::new())).await, Ok(5));
    }

    #[tokio::test]
    async fn panic_becomes_error() {
        let task = TaskFn::new("t", |_ctx: TaskContext| async {
            if true {
                panic!("kaboom");
            }
            Ok::<u8, TaskError>(0)
        });
        let res = run_once(task, ctx(CancellationToken::new())).await;
        assert_eq!(
            res,
            Err(TaskError::Panicked {
                info: "kaboom".into()
            })
        );
    }

    #[tokio::test]
    async fn cancelled_task_never_runs() {
        let token = CancellationToken::new();
        token.cancel();
        let task = TaskFn::new("t", |_ctx: TaskContext| async {
            if true {
                panic!("must not run");
            }
            Ok::<u8, TaskError>(0)
        });
        assert_eq!(run_once(task, ctx(token)).await, Err(TaskError::Canceled));
    }

    #[test]
    fn formats_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(format!("code {}", 7));
        assert_eq!(panic_message(payload), "code 7");
        let payload: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(payload), "unknown panic");
    }
}
