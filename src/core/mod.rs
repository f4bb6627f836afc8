//! Runtime core: dispatch, aggregation and lifecycle.
//!
//! The public API of this module is [`Dispatcher`] (bounded, ordered execution)
//! and [`Aggregator`] (partial-failure fan-out), plus their builders and configs.
//!
//! Internal modules:
//! - [`queue`]: FIFO of pending tasks; decides start order;
//! - [`runner`]: executes one task with panic isolation;
//! - [`alive`]: tracks executing tasks for stuck-task reports;
//! - [`dispatcher`]: permits, drain steps and close;
//! - [`aggregator`]: branches, deadlines and fallbacks;
//! - [`fanout`]: named branches collected into a composite.

mod aggregator;
mod alive;
mod builder;
mod config;
mod dispatcher;
mod fanout;
mod queue;
mod runner;

pub use aggregator::{Aggregator, Branch, aggregate};
pub use builder::{AggregatorBuilder, DispatcherBuilder};
pub use config::{AggregatorConfig, DispatcherConfig};
pub use dispatcher::Dispatcher;
pub use fanout::{Composite, FanOut};

pub(crate) use runner::panic_message;
