//! # Resolved branch outcome.
//!
//! Every aggregator branch resolves to a [`Resolved`]: either the call's own value
//! or the fallback together with the reason the call did not deliver.
//! Both variants carry a `T`, so a composite can always be built.

use crate::error::TaskError;

/// Outcome of one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    /// The call produced this value before its deadline.
    Value(T),
    /// The call failed, panicked or timed out; `value` came from the fallback policy.
    Fallback {
        /// Fallback value.
        value: T,
        /// Why the call's own value was not used.
        reason: TaskError,
    },
}

impl<T> Resolved<T> {
    /// Borrows the value, real or fallback.
    pub fn value(&self) -> &T {
        match self {
            Resolved::Value(v) | Resolved::Fallback { value: v, .. } => v,
        }
    }

    /// Unwraps the value, real or fallback.
    pub fn into_value(self) -> T {
        match self {
            Resolved::Value(v) | Resolved::Fallback { value: v, .. } => v,
        }
    }

    /// True if this field carries a fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolved::Fallback { .. })
    }

    /// The failure reason, for degraded fields.
    pub fn reason(&self) -> Option<&TaskError> {
        match self {
            Resolved::Value(_) => None,
            Resolved::Fallback { reason, .. } => Some(reason),
        }
    }

    /// Maps the value, keeping the degradation marker.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Value(v) => Resolved::Value(f(v)),
            Resolved::Fallback { value, reason } => Resolved::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}
