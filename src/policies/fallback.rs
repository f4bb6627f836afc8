//! # Fallback policy for aggregator branches.
//!
//! [`FallbackPolicy`] bundles the two knobs applied to one branch:
//! - an optional **timeout**, a hard deadline measured from branch start;
//! - the **fallback**, a fixed value or a function of the failure reason.
//!
//! A policy is applied to its own branch only; it never looks at other branches.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use fanvisor::{FallbackPolicy, TaskError};
//!
//! // Fixed sentinel after 100ms.
//! let rating = FallbackPolicy::value(-1).with_timeout(Duration::from_millis(100));
//! assert_eq!(rating.timeout(), Some(Duration::from_millis(100)));
//!
//! // Tell "too slow" apart from "errored".
//! let product = FallbackPolicy::with(|reason: &TaskError| {
//!     if reason.is_timeout() { "product-slow".to_string() } else { "product-not-found".to_string() }
//! });
//! assert_eq!(product.resolve(&TaskError::fail("404")), "product-not-found");
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TaskError;

type FallbackFn<T> = Arc<dyn Fn(&TaskError) -> T + Send + Sync>;

/// Where a branch's fallback value comes from.
enum Fallback<T> {
    Value(T),
    With(FallbackFn<T>),
}

/// Per-branch timeout and fallback configuration.
///
/// When `timeout` is `None` the aggregator's
/// [`default_timeout`](crate::AggregatorConfig::default_timeout) applies.
pub struct FallbackPolicy<T> {
    timeout: Option<Duration>,
    fallback: Fallback<T>,
}

impl<T> FallbackPolicy<T> {
    /// Falls back to a fixed value.
    pub fn value(value: T) -> Self {
        Self {
            timeout: None,
            fallback: Fallback::Value(value),
        }
    }

    /// Falls back to a value computed from the failure reason.
    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&TaskError) -> T + Send + Sync + 'static,
    {
        Self {
            timeout: None,
            fallback: Fallback::With(Arc::new(f)),
        }
    }

    /// Falls back to `T::default()`.
    pub fn default_value() -> Self
    where
        T: Default,
    {
        Self::value(T::default())
    }

    /// Returns a policy with a branch deadline.
    ///
    /// `Duration::ZERO` disables the deadline, overriding the aggregator default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a policy whose branch never times out, whatever the aggregator default.
    pub fn without_timeout(self) -> Self {
        self.with_timeout(Duration::ZERO)
    }

    /// Returns the configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Produces the fallback value for `reason`, consuming the policy.
    pub fn resolve(self, reason: &TaskError) -> T {
        match self.fallback {
            Fallback::Value(v) => v,
            Fallback::With(f) => f(reason),
        }
    }
}

impl<T: Clone> Clone for FallbackPolicy<T> {
    fn clone(&self) -> Self {
        let fallback = match &self.fallback {
            Fallback::Value(v) => Fallback::Value(v.clone()),
            Fallback::With(f) => Fallback::With(Arc::clone(f)),
        };
        Self {
            timeout: self.timeout,
            fallback,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FallbackPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("FallbackPolicy");
        d.field("timeout", &self.timeout);
        match &self.fallback {
            Fallback::Value(v) => d.field("fallback", v),
            Fallback::With(_) => d.field("fallback", &"<fn>"),
        };
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_ignores_reason() {
        let p = FallbackPolicy::value(-1);
        assert_eq!(p.clone().resolve(&TaskError::Canceled), -1);
        assert_eq!(p.resolve(&TaskError::fail("x")), -1);
    }

    #[test]
    fn function_sees_reason() {
        let p = FallbackPolicy::with(|r: &TaskError| r.as_label());
        assert_eq!(
            p.resolve(&TaskError::Timeout {
                timeout: Duration::from_millis(1)
            }),
            "task_timeout"
        );
    }

    #[test]
    fn timeout_defaults_to_none() {
        let p: FallbackPolicy<Vec<u8>> = FallbackPolicy::default_value();
        assert!(p.timeout().is_none());
        let p = p.with_timeout(Duration::from_secs(2));
        assert_eq!(p.timeout(), Some(Duration::from_secs(2)));
        assert_eq!(p.without_timeout().timeout(), Some(Duration::ZERO));
    }

    #[test]
    fn debug_hides_function() {
        let p = FallbackPolicy::with(|_: &TaskError| 0u8);
        assert_eq!(
            format!("{p:?}"),
            "FallbackPolicy { timeout: None, fallback: \"<fn>\" }"
        );
    }
}
