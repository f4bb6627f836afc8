//! # Event subscribers for the fanvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the optional built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Dispatcher / Aggregator ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                        │
//!                                                               ┌────────┼────────┐
//!                                                               ▼        ▼        ▼
//!                                                           LogWriter  Metrics  Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
