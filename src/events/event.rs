//! # Events published by dispatchers and aggregators.
//!
//! Every [`Event`] has an [`EventKind`] from one of four groups:
//! - **task**: a dispatcher task was queued, started, stopped or failed;
//! - **branch**: an aggregator branch started, resolved, timed out or fell back;
//! - **close**: a dispatcher was asked to close and how that went;
//! - **subscriber**: an event could not be delivered to a subscriber.
//!
//! Optional fields (`task`, `index`, `timeout_ms`, `reason`) are filled according
//! to the kind; see each variant.
//!
//! `seq` comes from one process-wide counter, so sorting by `seq` restores
//! publish order across buses and subscribers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use fanvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_task("rating")
//!     .with_timeout(Duration::from_millis(100));
//! assert_eq!(ev.timeout_ms, Some(100));
//!
//! let failed = Event::new(EventKind::TaskFailed)
//!     .with_task("fetch-42")
//!     .with_index(42)
//!     .with_reason("refused");
//! assert_eq!(failed.index, Some(42));
//! assert_eq!(failed.reason.as_deref(), Some("refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Dispatcher task events ===
    /// Task appended to the ordered queue.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    TaskQueued,

    /// Task dequeued under a permit and about to run.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    TaskStarting,

    /// Task finished and produced a value.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    TaskStopped,

    /// Task finished with an error or a panic (attached to its handle).
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: submission index
    /// - `reason`: failure message
    TaskFailed,

    /// A drain step held a permit but found no queued task; the permit was released.
    QueueEmpty,

    // === Dispatcher close events ===
    /// `close` was called; new submissions are rejected from now on.
    CloseRequested,

    /// All queued and in-flight tasks finished within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining tasks were cancelled.
    ///
    /// Sets:
    /// - `reason`: names of the stuck tasks
    GraceExceeded,

    // === Aggregator branch events ===
    /// Branch call started.
    ///
    /// Sets:
    /// - `task`: branch name
    /// - `timeout_ms`: branch deadline (absent when unbounded)
    BranchStarted,

    /// Branch resolved with the call's own value.
    ///
    /// Sets:
    /// - `task`: branch name
    BranchResolved,

    /// Branch deadline fired before the call finished.
    ///
    /// Sets:
    /// - `task`: branch name
    /// - `timeout_ms`: branch deadline
    TimeoutHit,

    /// Branch resolved to its fallback (always follows a failure or `TimeoutHit`).
    ///
    /// Sets:
    /// - `task`: branch name
    /// - `reason`: why the call did not produce a value
    BranchFallback,
}

/// One published occurrence plus the metadata its kind sets.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide publish order.
    pub seq: u64,
    /// When the event was created.
    pub at: SystemTime,
    pub kind: EventKind,

    /// Name of the task or branch, if applicable.
    pub task: Option<Arc<str>>,
    /// Submission index of the task within its dispatcher.
    pub index: Option<u64>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Failure text, stuck task names or delivery problem.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a new event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            index: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task (or branch) name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a submission index.
    #[inline]
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches a deadline, saturated to `u32::MAX` milliseconds.
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True for events describing a degraded branch.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, EventKind::BranchFallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::TaskQueued);
        let b = Event::new(EventKind::TaskStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_saturates_at_u32() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn overflow_event_names_subscriber() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.task.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
