//! # Named fan-out and its composite result.
//!
//! [`FanOut`] collects named branches of one aggregator and [`FanOut::run`] waits
//! for all of them, producing a [`Composite`] keyed by branch name.
//!
//! ```text
//! agg.fan_out()
//!    .branch("flight", ..)   ─► started now
//!    .branch("hotel",  ..)   ─► started now
//!    .branch("car",    ..)   ─► started now
//!    .run().await            ─► Composite { flight, hotel, car }   (all fields set)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use fanvisor::{Aggregator, AggregatorConfig, FallbackPolicy, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agg = Aggregator::new(AggregatorConfig::default())?;
//!
//!     let plan = agg
//!         .fan_out::<String>()
//!         .branch("flight", || async { Ok("AF-123".to_string()) }, FallbackPolicy::value("no-flight".into()))
//!         .branch("hotel", || async { Err(TaskError::fail("sold out")) }, FallbackPolicy::value("no-hotel".into()))
//!         .run()
//!         .await;
//!
//!     assert_eq!(plan.value("flight").map(String::as_str), Some("AF-123"));
//!     assert_eq!(plan.value("hotel").map(String::as_str), Some("no-hotel"));
//!     assert_eq!(plan.degraded(), vec!["hotel"]);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future;

use super::aggregator::{Aggregator, Branch};
use crate::{error::TaskError, policies::FallbackPolicy, tasks::Resolved};

/// Builder of a named fan-out over one [`Aggregator`].
#[must_use = "branches run regardless, but their values are lost unless `run` is awaited"]
pub struct FanOut<'a, T> {
    aggregator: &'a Aggregator,
    branches: Vec<Branch<T>>,
}

impl<'a, T: Send + 'static> FanOut<'a, T> {
    /// Starts an empty fan-out over `aggregator`; same as [`Aggregator::fan_out`].
    pub fn new(aggregator: &'a Aggregator) -> Self {
        Self {
            aggregator,
            branches: Vec::new(),
        }
    }

    /// Starts one more branch immediately.
    pub fn branch<F, Fut>(
        mut self,
        name: impl Into<Arc<str>>,
        call: F,
        policy: FallbackPolicy<T>,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let branch = self.aggregator.run_branch(name, call, policy);
        self.branches.push(branch);
        self
    }

    /// Number of branches started so far.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// True if no branch was added.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Waits for every branch.
    pub async fn run(self) -> Composite<T> {
        let names: Vec<Arc<str>> = self.branches.iter().map(Branch::name_arc).collect();
        let resolved = future::join_all(self.branches).await;
        Composite {
            entries: names.into_iter().zip(resolved).collect(),
        }
    }
}

/// Outcome of a fan-out: one [`Resolved`] per branch, in branch order.
#[derive(Debug, Clone)]
pub struct Composite<T> {
    entries: Vec<(Arc<str>, Resolved<T>)>,
}

impl<T> Composite<T> {
    /// Outcome of the first branch called `name`.
    pub fn get(&self, name: &str) -> Option<&Resolved<T>> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, r)| r)
    }

    /// Value (real or fallback) of the first branch called `name`.
    pub fn value(&self, name: &str) -> Option<&T> {
        self.get(name).map(Resolved::value)
    }

    /// Removes and returns the first branch called `name`.
    pub fn take(&mut self, name: &str) -> Option<Resolved<T>> {
        let pos = self.entries.iter().position(|(n, _)| n.as_ref() == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Names of the branches that fell back, in branch order.
    pub fn degraded(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, r)| r.is_degraded())
            .map(|(n, _)| n.as_ref())
            .collect()
    }

    /// True if no branch fell back.
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|(_, r)| !r.is_degraded())
    }

    /// Number of branches, degraded ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a fan-out that had no branches.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, outcome)` pairs in branch order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved<T>)> {
        self.entries.iter().map(|(n, r)| (n.as_ref(), r))
    }

    /// All values (real or fallback), in branch order.
    pub fn into_values(self) -> Vec<T> {
        self.entries
            .into_iter()
            .map(|(_, r)| r.into_value())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AggregatorConfig;

    #[tokio::test]
    async fn empty_fan_out_yields_empty_composite() {
        let agg = Aggregator::new(AggregatorConfig::default()).unwrap();
        let composite = agg.fan_out::<u8>().run().await;
        assert!(composite.is_empty());
        assert!(composite.is_complete());
    }

    #[tokio::test]
    async fn take_removes_entry() {
        let agg = Aggregator::new(AggregatorConfig::default()).unwrap();
        let mut composite = agg
            .fan_out()
            .branch("a", || async { Ok::<_, TaskError>(1) }, FallbackPolicy::value(0))
            .branch("b", || async { Err(TaskError::fail("x")) }, FallbackPolicy::value(0))
            .run()
            .await;

        assert_eq!(composite.degraded(), vec!["b"]);
        assert_eq!(composite.take("a"), Some(Resolved::Value(1)));
        assert!(composite.get("a").is_none());
        assert_eq!(composite.into_values(), vec![0]);
    }
}
