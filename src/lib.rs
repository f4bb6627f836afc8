//! # fanvisor
//!
//! **Fanvisor** is a small concurrency toolkit for tokio services that talk to
//! several backends at once.
//!
//! It provides two primitives and their composition:
//! - [`Dispatcher`]: runs submitted tasks with at most N executing at a time,
//!   starting them in exactly the order they were submitted;
//! - [`Aggregator`]: fans out independent calls, each with its own deadline and
//!   fallback, and always produces a complete composite result.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit(task)          submit(task)          submit(task)
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher                                                       │
//! │  - OrderedQueue (FIFO, assigns seq and start ordinal)             │
//! │  - Semaphore    (N admission permits)                             │
//! │  - AliveTracker (executing tasks, for stuck-task reports)         │
//! │  - TaskTracker  (every drain step; `close` waits on it)           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   drain step #1      drain step #2      drain step #N      (≤ N running)
//!        │                  │                  │
//!        │ TaskQueued / TaskStarting / TaskStopped / TaskFailed
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └──────────────────────────────▲──────────────────┬─────────────────┘
//!                                │                  ▼
//!        BranchStarted / TimeoutHit /        SubscriberSet
//!        BranchFallback / BranchResolved   (per-sub queues)
//!                                │          ┌───────┼───────┐
//! ┌──────────────────────────────┴───┐      ▼       ▼       ▼
//! │  Aggregator                      │   worker1 worker2 workerN
//! │  run_branch(call, policy)        │
//! │   ├─ call (spawned or dispatched)│
//! │   └─ resolver (deadline, events) │
//! │  aggregate / fan_out / first_ok  │
//! └──────────────────────────────────┘
//! ```
//!
//! ### Sequenced fan-out
//! ```text
//! Aggregator::builder(cfg).with_dispatcher(dispatcher)
//!
//!   branch "product"  ─► dispatcher slot ─► Resolved::Value(..)
//!   branch "rating"   ─► dispatcher slot ─► deadline hit ─► Resolved::Fallback{ -1, Timeout }
//!   branch "stock"    ─► queued (ceiling reached) ─► ... ─► Resolved::Value(..)
//!                                       │
//!                                       ▼
//!                         Composite (every field set)
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------|---------------------------------------------|
//! | **Dispatch**      | Bounded, submission-ordered execution with result handles.  | [`Dispatcher`], [`PendingResult`]           |
//! | **Aggregation**   | Per-branch deadline and fallback; composite always built.   | [`Aggregator`], [`Branch`], [`Composite`]   |
//! | **Policies**      | Fallback values and branch timeouts.                        | [`FallbackPolicy`]                          |
//! | **Subscriber API**| Hook into task and branch events.                           | [`Subscribe`]                               |
//! | **Errors**        | Typed errors for the runtime, tasks and submission.         | [`RuntimeError`], [`TaskError`], [`SubmitError`] |
//! | **Tasks**         | Closures or custom types with an explicit execution context.| [`Task`], [`TaskFn`], [`TaskContext`]       |
//! | **Configuration** | Centralize runtime settings.                                | [`DispatcherConfig`], [`AggregatorConfig`]  |
//!
//! ## Optional features
//! - `logging`: exports a `tracing`-backed [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use fanvisor::{Aggregator, AggregatorConfig, Dispatcher, DispatcherConfig, FallbackPolicy, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(DispatcherConfig::with_limit(3))?;
//!     let agg = Aggregator::builder(AggregatorConfig::default())
//!         .with_dispatcher(dispatcher.clone())
//!         .build()?;
//!
//!     let product = agg.run_branch(
//!         "product",
//!         || async { Ok::<_, TaskError>("Widget".to_string()) },
//!         FallbackPolicy::value("unknown".to_string()),
//!     );
//!     let rating = agg.run_branch(
//!         "rating",
//!         || async {
//!             tokio::time::sleep(Duration::from_millis(500)).await;
//!             Ok::<_, TaskError>(5)
//!         },
//!         FallbackPolicy::value(-1).with_timeout(Duration::from_millis(100)),
//!     );
//!
//!     let (product, rating) = tokio::join!(product, rating);
//!     assert_eq!(product.value(), "Widget");
//!     assert_eq!(rating.value(), &-1);
//!
//!     dispatcher.close().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    Aggregator, AggregatorBuilder, AggregatorConfig, Branch, Composite, Dispatcher,
    DispatcherBuilder, DispatcherConfig, FanOut, aggregate,
};
pub use error::{RuntimeError, SubmitError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::FallbackPolicy;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, PendingResult, Resolved, Task, TaskContext, TaskFn};

// Optional: expose a tracing-backed logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
