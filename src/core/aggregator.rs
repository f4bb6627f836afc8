//! # Aggregator: partial-failure fan-out with per-branch fallbacks.
//!
//! The [`Aggregator`] runs independent calls concurrently and turns each one into a
//! [`Branch`] that **always** resolves: to the call's value, or to its fallback when
//! the call fails, panics or misses its deadline.
//!
//! ## Branch lifecycle
//! ```text
//! run_branch(name, call, policy)
//!   ├─► publish BranchStarted
//!   ├─► start call                        (tokio::spawn, or Dispatcher::submit_named)
//!   └─► spawn resolver:
//!         deadline = start + timeout      (hard deadline, measured from run_branch)
//!         ├─ value before deadline  ──► Ok(v)               publish BranchResolved
//!         ├─ error / panic          ──► Err(reason)         publish BranchFallback
//!         └─ deadline hit           ──► Err(Timeout)        publish TimeoutHit, BranchFallback
//!
//! branch.await
//!   ├─ Ok(v)        → Resolved::Value(v)
//!   └─ Err(reason)  → Resolved::Fallback { value: policy.resolve(&reason), reason }
//! ```
//!
//! ## Rules
//! - Branches are independent: one branch's failure never touches another.
//! - The deadline runs from branch start, not from when the caller awaits it.
//! - A timed-out call is abandoned, not cancelled: its late result is discarded.
//! - [`aggregate`] waits for every branch; the composite is produced exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use futures::{
    FutureExt,
    future::{self, BoxFuture},
};
use tokio::{
    runtime::Handle,
    sync::oneshot,
    time::{self, Instant},
};
use tokio_util::sync::DropGuard;

use super::{
    builder::AggregatorBuilder,
    config::AggregatorConfig,
    dispatcher::Dispatcher,
    fanout::FanOut,
    runner::panic_message,
};
use crate::{
    error::{RuntimeError, TaskError},
    events::{Bus, Event, EventKind},
    policies::FallbackPolicy,
    tasks::Resolved,
};

/// Runs branch calls with per-branch deadlines and fallbacks.
///
/// Cheap to clone; clones share configuration, bus and dispatcher.
#[derive(Clone)]
pub struct Aggregator {
    cfg: AggregatorConfig,
    bus: Bus,
    runtime: Handle,
    dispatcher: Option<Dispatcher>,
    _listener: Option<Arc<DropGuard>>,
}

impl Aggregator {
    /// Creates an aggregator that spawns branch calls directly on the current runtime.
    pub fn new(cfg: AggregatorConfig) -> Result<Self, RuntimeError> {
        Self::builder(cfg).build()
    }

    /// Creates an aggregator whose branch calls run through `dispatcher`.
    ///
    /// Branch deadlines still run from branch start, so time spent queued for a
    /// dispatcher permit counts against them.
    pub fn with_dispatcher(cfg: AggregatorConfig, dispatcher: Dispatcher) -> Result<Self, RuntimeError> {
        Self::builder(cfg).with_dispatcher(dispatcher).build()
    }

    /// Returns a builder for attaching subscribers, a bus or a dispatcher.
    pub fn builder(cfg: AggregatorConfig) -> AggregatorBuilder {
        AggregatorBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: AggregatorConfig,
        bus: Bus,
        runtime: Handle,
        dispatcher: Option<Dispatcher>,
        listener: Option<DropGuard>,
    ) -> Self {
        Self {
            cfg,
            bus,
            runtime,
            dispatcher,
            _listener: listener.map(Arc::new),
        }
    }

    /// Starts `call` as a branch and returns its handle.
    ///
    /// The call and its deadline start now, whether or not the branch is ever awaited.
    /// The branch timeout is the policy's, else the configured default, else none.
    pub fn run_branch<F, Fut, T>(
        &self,
        name: impl Into<Arc<str>>,
        call: F,
        policy: FallbackPolicy<T>,
    ) -> Branch<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        let name: Arc<str> = name.into();
        let timeout = match policy.timeout() {
            Some(d) if d.is_zero() => None,
            Some(d) => Some(d),
            None => self.cfg.default_timeout(),
        };
        // A deadline past the clock's range is the same as none.
        let deadline = timeout.and_then(|d| Instant::now().checked_add(d).map(|at| (d, at)));

        let mut started = Event::new(EventKind::BranchStarted).with_task(Arc::clone(&name));
        if let Some(d) = timeout {
            started = started.with_timeout(d);
        }
        self.bus.publish(started);

        let call = self.start_call(&name, call);
        let (tx, rx) = oneshot::channel();
        let bus = self.bus.clone();
        let branch = Arc::clone(&name);

        self.runtime.spawn(async move {
            let outcome = match deadline {
                Some((timeout, at)) => match time::timeout_at(at, call).await {
                    Ok(res) => res,
                    Err(_elapsed) => {
                        bus.publish(
                            Event::new(EventKind::TimeoutHit)
                                .with_task(Arc::clone(&branch))
                                .with_timeout(timeout),
                        );
                        Err(TaskError::Timeout { timeout })
                    }
                },
                None => call.await,
            };

            match &outcome {
                Ok(_) => bus.publish(Event::new(EventKind::BranchResolved).with_task(branch)),
                Err(reason) => bus.publish(
                    Event::new(EventKind::BranchFallback)
                        .with_task(branch)
                        .with_reason(reason.to_string()),
                ),
            }
            let _ = tx.send(outcome);
        });

        Branch {
            name,
            rx,
            policy: Some(policy),
        }
    }

    /// Starts a builder that collects named branches into a [`Composite`](crate::Composite).
    pub fn fan_out<T: Send + 'static>(&self) -> FanOut<'_, T> {
        FanOut::new(self)
    }

    /// Races `calls` and returns the first success.
    ///
    /// Errors only if every call failed (with the last failure) or if `timeout`
    /// (falling back to the configured default) elapsed first. Losing calls are
    /// left to finish in the background.
    pub async fn first_ok<F, Fut, T>(
        &self,
        calls: Vec<F>,
        timeout: Option<Duration>,
    ) -> Result<T, TaskError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        if calls.is_empty() {
            return Err(TaskError::fail("no calls to race"));
        }

        let racers: Vec<_> = calls
            .into_iter()
            .enumerate()
            .map(|(i, call)| self.start_call(&Arc::from(format!("race-{i}")), call))
            .collect();
        let race = future::select_ok(racers);

        let winner = match timeout.or_else(|| self.cfg.default_timeout()) {
            Some(d) => time::timeout(d, race)
                .await
                .map_err(|_elapsed| TaskError::Timeout { timeout: d })?,
            None => race.await,
        };
        winner.map(|(value, _losers)| value)
    }

    /// Event bus branch events are published to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    fn start_call<F, Fut, T>(&self, name: &Arc<str>, call: F) -> BoxFuture<'static, Result<T, TaskError>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        if let Some(dispatcher) = &self.dispatcher {
            return match dispatcher.submit_named(Arc::clone(name), move |_ctx| call()) {
                Ok(pending) => pending.boxed(),
                Err(e) => future::ready(Err(TaskError::fail(e))).boxed(),
            };
        }

        let handle = self.runtime.spawn(async move { call().await });
        async move {
            match handle.await {
                Ok(res) => res,
                Err(e) if e.is_panic() => Err(TaskError::Panicked {
                    info: panic_message(e.into_panic()),
                }),
                Err(_) => Err(TaskError::Canceled),
            }
        }
        .boxed()
    }
}

/// Handle of one running branch; resolves to a [`Resolved`] and never fails.
///
/// Dropping it does not stop the call; its outcome is then discarded.
#[must_use = "a branch value is lost unless the branch is awaited"]
pub struct Branch<T> {
    name: Arc<str>,
    rx: oneshot::Receiver<Result<T, TaskError>>,
    policy: Option<FallbackPolicy<T>>,
}

impl<T> Branch<T> {
    /// Branch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

// No field is ever pinned.
impl<T> Unpin for Branch<T> {}

impl<T> Future for Branch<T> {
    type Output = Resolved<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let outcome = ready!(Pin::new(&mut this.rx).poll(cx)).unwrap_or(Err(TaskError::Abandoned));
        let policy = this
            .policy
            .take()
            .expect("Branch polled after completion");

        Poll::Ready(match outcome {
            Ok(value) => Resolved::Value(value),
            Err(reason) => Resolved::Fallback {
                value: policy.resolve(&reason),
                reason,
            },
        })
    }
}

/// Waits for every branch and hands their outcomes, in branch order, to `combine`.
///
/// Completes once the slowest branch resolved (bounded by the largest deadline
/// when every branch has one).
pub async fn aggregate<T, O>(
    branches: Vec<Branch<T>>,
    combine: impl FnOnce(Vec<Resolved<T>>) -> O,
) -> O {
    combine(future::join_all(branches).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_call_falls_back_at_deadline() {
        let agg = Aggregator::new(AggregatorConfig::default()).unwrap();
        let started = Instant::now();

        let rating = agg.run_branch(
            "rating",
            || async {
                time::sleep(Duration::from_millis(500)).await;
                Ok::<i32, TaskError>(5)
            },
            FallbackPolicy::value(-1).with_timeout(Duration::from_millis(100)),
        );
        let res = rating.await;

        assert_eq!(res.value(), &-1);
        assert!(res.reason().is_some_and(TaskError::is_timeout));
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_runs_from_branch_start() {
        let agg = Aggregator::new(AggregatorConfig::default()).unwrap();
        let branch = agg.run_branch(
            "late-await",
            || async {
                time::sleep(Duration::from_millis(300)).await;
                Ok::<_, TaskError>("slow")
            },
            FallbackPolicy::value("fallback").with_timeout(Duration::from_millis(100)),
        );

        time::sleep(Duration::from_millis(200)).await;
        let started_awaiting = Instant::now();
        assert_eq!(branch.await.into_value(), "fallback");
        assert!(started_awaiting.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn panic_in_call_uses_fallback() {
        let agg = Aggregator::new(AggregatorConfig::default()).unwrap();
        let res = agg
            .run_branch(
                "bad",
                || async {
                    if true {
                        panic!("upstream exploded");
                    }
                    Ok::<u8, TaskError>(1)
                },
                FallbackPolicy::with(|reason: &TaskError| match reason {
                    TaskError::Panicked { .. } => 7,
                    _ => 0,
                }),
            )
            .await;
        assert_eq!(res.into_value(), 7);
    }

    #[tokio::test]
    async fn first_ok_with_no_calls_errors() {
        let agg = Aggregator::new(AggregatorConfig::default()).unwrap();
        let calls: Vec<fn() -> future::Ready<Result<u8, TaskError>>> = Vec::new();
        assert_eq!(
            agg.first_ok(calls, None).await,
            Err(TaskError::fail("no calls to race"))
        );
    }
}
