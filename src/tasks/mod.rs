//! # Task abstractions and result handles.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for one-shot named units of work
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskContext`] - immutable per-execution context handed to each task
//! - [`PendingResult`] - caller-side handle resolved exactly once
//! - [`Resolved`] - branch outcome (real value or fallback)

mod context;
mod pending;
mod resolved;
mod task;
mod task_fn;

pub use context::TaskContext;
pub use pending::PendingResult;
pub use resolved::Resolved;
pub use task::{BoxTaskFuture, Task};
pub use task_fn::TaskFn;
