//! # Ordered queue of pending tasks.
//!
//! The queue is the only place where execution order is decided. It is a
//! separate structure from the admission permits: a permit says *that* a slot
//! may run something, the queue says *what* it runs.
//!
//! ## Rules
//! - `push` assigns the submission index (`seq`) under the same lock that appends.
//! - `pop` removes the oldest task and assigns its start `ordinal` under the same lock,
//!   so `ordinal == seq` no matter which slot pops.
//! - Once closed, `push` rejects new tasks; already queued tasks stay drainable.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;

use crate::error::{SubmitError, TaskError};
use crate::tasks::TaskContext;

/// Type-erased task body: runs the task, resolves its handle, reports the outcome.
pub(crate) type Job = Box<dyn FnOnce(TaskContext) -> BoxFuture<'static, Result<(), TaskError>> + Send>;

/// A queued task.
pub(crate) struct Queued {
    pub seq: u64,
    pub name: Arc<str>,
    pub job: Job,
}

/// Task removed from the head of the queue.
pub(crate) struct Dequeued {
    pub task: Queued,
    pub ordinal: u64,
}

struct QueueState {
    items: VecDeque<Queued>,
    next_seq: u64,
    next_ordinal: u64,
    closed: bool,
}

/// FIFO of pending tasks, safe for any number of concurrent pushers and poppers.
pub(crate) struct OrderedQueue {
    state: Mutex<QueueState>,
}

impl OrderedQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                next_seq: 0,
                next_ordinal: 0,
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a task and runs `admitted` while still holding the lock.
    ///
    /// `name` defaults to `task-{seq}`. `admitted` must not block; it is where the
    /// caller schedules the drain step, so that `close` cannot slip in between.
    pub fn push(
        &self,
        name: Option<Arc<str>>,
        job: Job,
        admitted: impl FnOnce(u64, &Arc<str>),
    ) -> Result<(u64, Arc<str>), SubmitError> {
        let mut state = self.lock();
        if state.closed {
            return Err(SubmitError::Closed);
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let name = name.unwrap_or_else(|| Arc::from(format!("task-{seq}")));

        state.items.push_back(Queued {
            seq,
            name: Arc::clone(&name),
            job,
        });
        admitted(seq, &name);
        Ok((seq, name))
    }

    /// Removes the oldest task, if any.
    pub fn pop(&self) -> Option<Dequeued> {
        let mut state = self.lock();
        let task = state.items.pop_front()?;
        let ordinal = state.next_ordinal;
        state.next_ordinal += 1;
        Some(Dequeued { task, ordinal })
    }

    /// Rejects further pushes. Returns `true` if this call closed the queue.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        !std::mem::replace(&mut state.closed, true)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop_job() -> Job {
        Box::new(|_ctx| async { Ok(()) }.boxed())
    }

    #[test]
    fn pops_in_push_order_with_matching_ordinals() {
        let q = OrderedQueue::new();
        for _ in 0..5 {
            q.push(None, noop_job(), |_, _| {}).unwrap();
        }
        let mut seen = Vec::new();
        while let Some(d) = q.pop() {
            assert_eq!(d.task.seq, d.ordinal);
            seen.push(d.task.name.to_string());
        }
        assert_eq!(seen, vec!["task-0", "task-1", "task-2", "task-3", "task-4"]);
    }

    #[test]
    fn closed_queue_rejects_but_drains() {
        let q = OrderedQueue::new();
        q.push(Some(Arc::from("kept")), noop_job(), |_, _| {}).unwrap();
        assert!(q.close());
        assert!(!q.close());

        let mut admitted = false;
        let res = q.push(None, noop_job(), |_, _| admitted = true);
        assert_eq!(res.err(), Some(SubmitError::Closed));
        assert!(!admitted);

        assert_eq!(q.len(), 1);
        assert_eq!(q.pop().map(|d| d.task.name.to_string()), Some("kept".into()));
        assert!(q.pop().is_none());
    }

    #[test]
    fn concurrent_pushers_get_unique_dense_seqs() {
        let q = Arc::new(OrderedQueue::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let q = Arc::clone(&q);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| q.push(None, noop_job(), |_, _| {}).unwrap().0)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = threads
            .into_iter()
            .flat_map(|t| t.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..800).collect::<Vec<u64>>());
    }
}
