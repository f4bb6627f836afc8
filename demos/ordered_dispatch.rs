//! # Example: ordered_dispatch
//!
//! Runs 20 calls against a backend that allows at most 3 concurrent requests.
//!
//! Shows how to:
//! - Create a [`Dispatcher`] with a concurrency ceiling.
//! - Submit tasks and await their [`PendingResult`](fanvisor::PendingResult)s.
//! - Use [`Dispatcher::map_ordered`] for a bounded map with ordered results.
//!
//! ## Flow
//! ```text
//! submit ×20 ──► OrderedQueue ──► 3 slots ──► call(id) (random latency)
//!                    │
//!                    └─ start order == submission order
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example ordered_dispatch
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fanvisor::{Dispatcher, DispatcherConfig, TaskContext, TaskError};
use rand::Rng;
use tracing_subscriber::EnvFilter;

async fn fetch_product(id: u64) -> Result<String, TaskError> {
    let latency = rand::rng().random_range(20..120);
    tokio::time::sleep(Duration::from_millis(latency)).await;
    if id % 7 == 0 {
        return Err(TaskError::fail(format!("product {id} not found")));
    }
    Ok(format!("product-{id}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dispatcher = Dispatcher::new(DispatcherConfig::with_limit(3))?;
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for id in 1..=20u64 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        handles.push(dispatcher.submit(move |ctx: TaskContext| async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tracing::info!(task = ctx.name(), ordinal = ctx.ordinal(), in_flight = now, "start");

            let res = fetch_product(id).await;
            running.fetch_sub(1, Ordering::SeqCst);
            res
        })?);
    }

    for h in handles {
        let name = h.name().to_string();
        match h.await {
            Ok(product) => tracing::info!(task = %name, %product, "done"),
            Err(e) => tracing::warn!(task = %name, error = %e, "failed"),
        }
    }
    tracing::info!(peak = peak.load(Ordering::SeqCst), ceiling = dispatcher.ceiling(), "all submitted tasks resolved");

    let products = dispatcher.map_ordered(21..=30u64, fetch_product).await?;
    for (id, res) in (21..=30u64).zip(products) {
        tracing::info!(id, outcome = ?res, "mapped");
    }

    dispatcher.close().await;
    Ok(())
}
