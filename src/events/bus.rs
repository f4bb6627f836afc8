//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (drain steps, branch
//! resolvers, close).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Subscriber (one per owner):
//!   drain step 1 ──┐
//!   drain step N ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   branch K     ──┤  (broadcast chan)    (spawned by builder)
//!   close()      ──┘
//! ```
//!
//! A `Bus` may be shared between a [`Dispatcher`](crate::Dispatcher) and an
//! [`Aggregator`](crate::Aggregator) so one subscriber set observes both.
//!
//! ## Rules
//! - `publish` is synchronous and safe under the queue lock; it never waits on receivers.
//! - One ring buffer of `capacity` events backs every receiver; a receiver that
//!   falls behind skips the oldest events (the listener logs how many).
//! - With no receiver, published events are simply dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events; clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// The capacity is shared across all receivers and clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Fire-and-forget publish.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receiver_sees_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::TaskQueued));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::TaskStarting));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskStarting);
    }
}
