//! # Branch policies.
//!
//! - [`FallbackPolicy`] — per-branch deadline and fallback value used by the
//!   [`Aggregator`](crate::Aggregator).

mod fallback;

pub use fallback::FallbackPolicy;
