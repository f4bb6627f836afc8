//! # LogWriter — events to `tracing`
//!
//! A subscriber that turns incoming [`Event`]s into structured `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG fanvisor: queued task="fetch-3" index=3
//!  INFO fanvisor: starting task="fetch-3" index=3
//!  WARN fanvisor: failed task="fetch-3" index=3 reason="execution failed: refused"
//!  WARN fanvisor: timeout branch="weather" timeout_ms=100
//!  WARN fanvisor: fallback branch="weather" reason="timed out after 100ms"
//!  WARN fanvisor: grace-exceeded stuck="slow-1"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

const TARGET: &str = "fanvisor";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskQueued => {
                tracing::debug!(target: TARGET, task, index = e.index, "queued");
            }
            EventKind::TaskStarting => {
                tracing::info!(target: TARGET, task, index = e.index, "starting");
            }
            EventKind::TaskStopped => {
                tracing::info!(target: TARGET, task, index = e.index, "stopped");
            }
            EventKind::TaskFailed => {
                tracing::warn!(target: TARGET, task, index = e.index, reason, "failed");
            }
            EventKind::QueueEmpty => {
                tracing::debug!(target: TARGET, "drain found empty queue");
            }
            EventKind::CloseRequested => {
                tracing::info!(target: TARGET, "close-requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: TARGET, "all-stopped-within-grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: TARGET, stuck = reason, "grace-exceeded");
            }
            EventKind::BranchStarted => {
                tracing::debug!(target: TARGET, branch = task, timeout_ms = e.timeout_ms, "branch-started");
            }
            EventKind::BranchResolved => {
                tracing::debug!(target: TARGET, branch = task, "branch-resolved");
            }
            EventKind::TimeoutHit => {
                tracing::warn!(target: TARGET, branch = task, timeout_ms = e.timeout_ms, "timeout");
            }
            EventKind::BranchFallback => {
                tracing::warn!(target: TARGET, branch = task, reason, "fallback");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: TARGET, subscriber = task, reason, "subscriber-overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: TARGET, subscriber = task, reason, "subscriber-panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
