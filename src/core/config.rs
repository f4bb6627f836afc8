//! # Runtime configuration.
//!
//! Provides [`DispatcherConfig`] and [`AggregatorConfig`], plain structs with
//! public fields and sane defaults.
//!
//! ## Sentinel values
//! - `AggregatorConfig::default_timeout = 0s` → branches without their own timeout are unbounded
//! - `bus_capacity` is clamped to at least 1
//!
//! `DispatcherConfig::max_concurrent` has no sentinel: it is an external
//! contract and must be at least 1.

use std::time::Duration;

use crate::error::RuntimeError;

/// Configuration of a [`Dispatcher`](crate::Dispatcher).
///
/// ## Field semantics
/// - `max_concurrent`: concurrency ceiling N (number of admission permits, `>= 1`)
/// - `grace`: how long [`Dispatcher::shutdown`](crate::Dispatcher::shutdown) waits before cancelling
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Maximum number of tasks executing at the same time.
    pub max_concurrent: usize,

    /// Maximum time `shutdown` waits for queued and in-flight tasks.
    ///
    /// After it elapses every task token is cancelled and
    /// `RuntimeError::GraceExceeded` is returned.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl DispatcherConfig {
    /// Configuration with the given ceiling and default everything else.
    pub fn with_limit(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Self::default()
        }
    }

    /// Checks that the configuration can back a dispatcher.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.max_concurrent == 0 {
            return Err(RuntimeError::InvalidConfig {
                reason: "max_concurrent must be at least 1",
            });
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - `max_concurrent = 16`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}

/// Configuration of an [`Aggregator`](crate::Aggregator).
#[derive(Clone, Debug)]
pub struct AggregatorConfig {
    /// Deadline for branches whose policy has no timeout (`0s` = unbounded).
    pub default_timeout: Duration,

    /// Capacity of the event bus (ignored when a bus is shared in).
    pub bus_capacity: usize,
}

impl AggregatorConfig {
    /// Returns the default branch timeout as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → deadline applied per branch
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.default_timeout == Duration::ZERO {
            None
        } else {
            Some(self.default_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for AggregatorConfig {
    /// Default configuration:
    ///
    /// - `default_timeout = 0s` (no deadline unless the policy sets one)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            default_timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}
