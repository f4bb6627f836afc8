use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::DropGuard;

use super::{
    aggregator::Aggregator,
    config::{AggregatorConfig, DispatcherConfig},
    dispatcher::Dispatcher,
};
use crate::{
    error::RuntimeError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Dispatcher`] with optional features.
pub struct DispatcherBuilder {
    cfg: DispatcherConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus: Option<Bus>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: DispatcherConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            bus: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive dispatcher events (queued, starting, stopped, failed, ...)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Publishes into an existing bus instead of creating one.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the dispatcher on the current tokio runtime.
    ///
    /// Fails with [`RuntimeError::InvalidConfig`] for a zero ceiling and with
    /// [`RuntimeError::NoRuntime`] outside a runtime.
    pub fn build(self) -> Result<Dispatcher, RuntimeError> {
        self.cfg.validate()?;
        let runtime = Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;

        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        let listener = listen(self.subscribers, &bus);

        Ok(Dispatcher::from_parts(self.cfg, bus, runtime, listener))
    }
}

/// Builder for constructing an [`Aggregator`].
pub struct AggregatorBuilder {
    cfg: AggregatorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus: Option<Bus>,
    dispatcher: Option<Dispatcher>,
}

impl AggregatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: AggregatorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            bus: None,
            dispatcher: None,
        }
    }

    /// Sets event subscribers for branch events.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Publishes into an existing bus instead of creating one.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Runs every branch call through `dispatcher`, so branch calls share its
    /// concurrency ceiling and submission order.
    ///
    /// Unless [`with_bus`](Self::with_bus) is also set, branch events go to the
    /// dispatcher's bus.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Builds the aggregator on the current tokio runtime.
    pub fn build(self) -> Result<Aggregator, RuntimeError> {
        let runtime = match &self.dispatcher {
            Some(d) => d.runtime().clone(),
            None => Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?,
        };

        let bus = match (self.bus, &self.dispatcher) {
            (Some(bus), _) => bus,
            (None, Some(d)) => d.bus().clone(),
            (None, None) => Bus::new(self.cfg.bus_capacity_clamped()),
        };
        let listener = {
            let _enter = runtime.enter();
            listen(self.subscribers, &bus)
        };

        Ok(Aggregator::from_parts(
            self.cfg,
            bus,
            runtime,
            self.dispatcher,
            listener,
        ))
    }
}

/// Starts subscriber workers and the bus listener; `None` without subscribers.
fn listen(subscribers: Vec<Arc<dyn Subscribe>>, bus: &Bus) -> Option<DropGuard> {
    if subscribers.is_empty() {
        return None;
    }
    Some(SubscriberSet::new(subscribers, bus.clone()).spawn_listener(bus))
}
