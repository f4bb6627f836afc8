//! # Dispatcher: bounded concurrency with submission-order execution.
//!
//! The [`Dispatcher`] runs an unbounded stream of submitted tasks on at most
//! `max_concurrent` execution slots, and starts them in exactly the order they
//! were submitted.
//!
//! ## Why the queue is separate from the permits
//! A fair semaphore only orders *which waiter gets a permit*. It says nothing
//! about *which task* the winner then runs. Ordering is therefore decided at a
//! single atomic dequeue from the [`OrderedQueue`], independent of which drain
//! step performs it.
//!
//! ## Flow
//! ```text
//! submit(task) ──► OrderedQueue.push(task)        (seq assigned, caller returns)
//!                  └─► spawn drain_one()           (one lightweight tokio task per submit)
//!
//! drain_one():
//!   ├─► acquire permit                             (only this step waits, never the caller)
//!   ├─► OrderedQueue.pop()                         (oldest task, ordinal assigned)
//!   │     └─ empty → release permit, publish QueueEmpty
//!   ├─► publish TaskStarting
//!   ├─► run_once(task)                             (panics caught)
//!   │     ├─ Ok  ──► resolve handle, publish TaskStopped
//!   │     └─ Err ──► resolve handle, publish TaskFailed
//!   └─► drop permit                                (every path)
//!
//! close():
//!   ├─► OrderedQueue.close()                       (further submits → SubmitError::Closed)
//!   └─► wait for every spawned drain step
//! ```
//!
//! ## Example
//! ```rust
//! use fanvisor::{Dispatcher, DispatcherConfig, TaskContext, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Third-party contract: at most 3 concurrent calls.
//!     let dispatcher = Dispatcher::new(DispatcherConfig::with_limit(3))?;
//!
//!     let handles: Vec<_> = (1..=10u64)
//!         .map(|id| dispatcher.submit(move |_ctx: TaskContext| async move {
//!             Ok::<_, TaskError>(format!("product-{id}"))
//!         }))
//!         .collect::<Result<_, _>>()?;
//!
//!     for h in handles {
//!         println!("{}", h.await?);
//!     }
//!     dispatcher.close().await;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, future};
use tokio::{
    runtime::Handle,
    sync::{Semaphore, oneshot},
    time,
};
use tokio_util::{
    sync::{CancellationToken, DropGuard},
    task::TaskTracker,
};

use super::{
    alive::AliveTracker,
    builder::DispatcherBuilder,
    config::DispatcherConfig,
    queue::{Dequeued, Job, OrderedQueue, Queued},
    runner::run_once,
};
use crate::{
    error::{RuntimeError, SubmitError, TaskError},
    events::{Bus, Event, EventKind},
    tasks::{PendingResult, Task, TaskContext, TaskFn},
};

/// Bounded, order-preserving task dispatcher.
///
/// Cheap to clone; clones share the same queue, permits and event bus.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    cfg: DispatcherConfig,
    /// Admission permits (N = `cfg.max_concurrent`).
    permits: Arc<Semaphore>,
    /// Pending tasks in submission order.
    queue: OrderedQueue,
    /// Executing tasks, for stuck-task reports.
    alive: Arc<AliveTracker>,
    /// Every spawned drain step; `close` waits on it.
    tracker: TaskTracker,
    runtime: Handle,
    /// Parent of every task token; cancelled when a close grace expires.
    runtime_token: CancellationToken,
    bus: Bus,
    _listener: Option<DropGuard>,
}

impl Dispatcher {
    /// Creates a dispatcher without subscribers.
    ///
    /// Must be called inside a tokio runtime; tasks are spawned on that runtime.
    pub fn new(cfg: DispatcherConfig) -> Result<Self, RuntimeError> {
        Self::builder(cfg).build()
    }

    /// Returns a builder for attaching subscribers or a shared bus.
    pub fn builder(cfg: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: DispatcherConfig,
        bus: Bus,
        runtime: Handle,
        listener: Option<DropGuard>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                permits: Arc::new(Semaphore::new(cfg.max_concurrent)),
                cfg,
                queue: OrderedQueue::new(),
                alive: Arc::new(AliveTracker::new()),
                tracker: TaskTracker::new(),
                runtime,
                runtime_token: CancellationToken::new(),
                bus,
                _listener: listener,
            }),
        }
    }

    /// Submits a closure as a task named `task-{seq}`.
    ///
    /// Returns immediately. The handle resolves with the closure's value, its
    /// error, or [`TaskError::Panicked`]. Fails only if the dispatcher is closed,
    /// in which case nothing was queued.
    pub fn submit<F, Fut, R>(&self, f: F) -> Result<PendingResult<R>, SubmitError>
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: Send + 'static,
    {
        self.enqueue(None, TaskFn::new("", f))
    }

    /// Submits a closure under an explicit name.
    pub fn submit_named<F, Fut, R>(
        &self,
        name: impl Into<Arc<str>>,
        f: F,
    ) -> Result<PendingResult<R>, SubmitError>
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: Send + 'static,
    {
        self.enqueue(Some(name.into()), TaskFn::new("", f))
    }

    /// Submits any [`Task`] implementation under its own name.
    pub fn submit_task<T: Task>(&self, task: T) -> Result<PendingResult<T::Output>, SubmitError> {
        let name: Arc<str> = Arc::from(task.name());
        self.enqueue(Some(name), task)
    }

    fn enqueue<T: Task>(
        &self,
        name: Option<Arc<str>>,
        task: T,
    ) -> Result<PendingResult<T::Output>, SubmitError> {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |ctx| {
            async move {
                let res = run_once(task, ctx).await;
                let report = match &res {
                    Ok(_) => Ok(()),
                    Err(e) => Err(e.clone()),
                };
                let _ = tx.send(res);
                report
            }
            .boxed()
        });

        let inner = &self.inner;
        let (seq, name) = inner.queue.push(name, job, |seq, name| {
            inner.bus.publish(
                Event::new(EventKind::TaskQueued)
                    .with_task(Arc::clone(name))
                    .with_index(seq),
            );
            let me = Arc::clone(inner);
            inner
                .tracker
                .spawn_on(async move { me.drain_one().await }, &inner.runtime);
        })?;

        Ok(PendingResult::new(seq, name, rx))
    }

    /// Runs `f` over `items` with at most `max_concurrent` calls in flight and
    /// returns the results in input order.
    ///
    /// If the dispatcher gets closed midway, the items already submitted still run
    /// but their results are discarded and `SubmitError::Closed` is returned.
    pub async fn map_ordered<I, T, F, Fut, R>(
        &self,
        items: I,
        f: F,
    ) -> Result<Vec<Result<R, TaskError>>, SubmitError>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: Send + 'static,
    {
        let f = Arc::new(f);
        let handles = items
            .into_iter()
            .map(|item| {
                let f = Arc::clone(&f);
                self.submit(move |_ctx| f(item))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(future::join_all(handles).await)
    }

    /// Stops accepting submissions and waits until every queued and in-flight task finished.
    ///
    /// Closing an idle dispatcher returns immediately.
    pub async fn close(&self) {
        self.begin_close();
        self.inner.tracker.wait().await;
        self.inner
            .bus
            .publish(Event::new(EventKind::AllStoppedWithin));
    }

    /// Like [`close`](Self::close), but gives up after `grace`.
    ///
    /// On expiry every task token is cancelled (queued tasks then resolve to
    /// [`TaskError::Canceled`] without running) and the names of the tasks still
    /// executing are returned in [`RuntimeError::GraceExceeded`].
    pub async fn close_with_grace(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.begin_close();

        match time::timeout(grace, self.inner.tracker.wait()).await {
            Ok(()) => {
                self.inner
                    .bus
                    .publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self.inner.alive.snapshot();
                self.inner.runtime_token.cancel();
                self.inner.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// [`close_with_grace`](Self::close_with_grace) with the configured grace.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.close_with_grace(self.inner.cfg.grace).await
    }

    fn begin_close(&self) {
        if self.inner.queue.close() {
            self.inner
                .bus
                .publish(Event::new(EventKind::CloseRequested));
        }
        self.inner.tracker.close();
    }

    /// Number of tasks waiting for a permit.
    pub fn queued(&self) -> usize {
        self.inner.queue.len()
    }

    /// Number of tasks currently executing.
    pub fn in_flight(&self) -> usize {
        self.inner.alive.len()
    }

    /// Permits not held by any executing task.
    pub fn available_permits(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// The concurrency ceiling N.
    pub fn ceiling(&self) -> usize {
        self.inner.cfg.max_concurrent
    }

    /// True once `close` (or a variant) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.queue.is_closed()
    }

    /// Event bus this dispatcher publishes to.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }
}

impl Inner {
    /// One execution slot: permit → oldest task → run → release.
    async fn drain_one(&self) {
        // `permits` is never closed.
        let Ok(_permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return;
        };

        let Some(Dequeued { task, ordinal }) = self.queue.pop() else {
            tracing::debug!("drain step found empty queue; releasing permit");
            self.bus.publish(Event::new(EventKind::QueueEmpty));
            return;
        };

        let Queued { seq, name, job } = task;
        let _alive = self.alive.enter(seq, Arc::clone(&name));
        let ctx = TaskContext::new(
            seq,
            ordinal,
            Arc::clone(&name),
            self.runtime_token.child_token(),
        );

        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(Arc::clone(&name))
                .with_index(seq),
        );

        match job(ctx).await {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::TaskStopped)
                    .with_task(name)
                    .with_index(seq),
            ),
            Err(e) => self.bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name)
                    .with_index(seq)
                    .with_reason(e.to_string()),
            ),
        }
    }
}
