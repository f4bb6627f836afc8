//! # Example: product_catalog
//!
//! Builds product pages from two backends (product info and rating). Both
//! backends share one contract of at most 3 concurrent calls, and a rating that
//! takes longer than 100ms is replaced by `-1`.
//!
//! Shows how to:
//! - Route aggregator branches through a shared [`Dispatcher`].
//! - Combine branch outcomes with [`aggregate`] and a [`FanOut`](fanvisor::FanOut).
//! - Report degraded fields from a [`Composite`](fanvisor::Composite).
//!
//! ## Flow
//! ```text
//! page(id)
//!   ├─► "product" ─► dispatcher slot ─► name or "product-not-found"
//!   └─► "rating"  ─► dispatcher slot ─► stars or -1 after 100ms
//!
//! dispatcher: ceiling 3, shared by every page
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example product_catalog
//! ```

use std::time::Duration;

use fanvisor::{
    Aggregator, AggregatorConfig, Dispatcher, DispatcherConfig, FallbackPolicy, Resolved,
    TaskError, aggregate,
};
use rand::Rng;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
enum Field {
    Product(String),
    Rating(i32),
}

async fn fetch_product(id: u32) -> Result<Field, TaskError> {
    sleep(Duration::from_millis(30)).await;
    if id == 4 {
        return Err(TaskError::fail(format!("product {id} not found")));
    }
    Ok(Field::Product(format!("product-{id}")))
}

async fn fetch_rating(id: u32) -> Result<Field, TaskError> {
    let latency = rand::rng().random_range(10..200);
    sleep(Duration::from_millis(latency)).await;
    Ok(Field::Rating((id % 5 + 1) as i32))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dispatcher = Dispatcher::new(DispatcherConfig::with_limit(3))?;
    let agg = Aggregator::with_dispatcher(AggregatorConfig::default(), dispatcher.clone())?;

    // One page through the named fan-out.
    let page = agg
        .fan_out()
        .branch(
            "product",
            || fetch_product(1),
            FallbackPolicy::value(Field::Product("product-not-found".into())),
        )
        .branch(
            "rating",
            || fetch_rating(1),
            FallbackPolicy::value(Field::Rating(-1)).with_timeout(Duration::from_millis(100)),
        )
        .run()
        .await;
    tracing::info!(fields = ?page.iter().collect::<Vec<_>>(), degraded = ?page.degraded(), "page 1");

    // Many pages with a plain combine function.
    let mut pages = Vec::new();
    for id in 2..=6u32 {
        let branches = vec![
            agg.run_branch(
                format!("product-{id}"),
                move || fetch_product(id),
                FallbackPolicy::value(Field::Product("product-not-found".into())),
            ),
            agg.run_branch(
                format!("rating-{id}"),
                move || fetch_rating(id),
                FallbackPolicy::value(Field::Rating(-1)).with_timeout(Duration::from_millis(100)),
            ),
        ];
        pages.push(aggregate(branches, move |fields: Vec<Resolved<Field>>| {
            let degraded = fields.iter().filter(|f| f.is_degraded()).count();
            let mut name = String::new();
            let mut stars = 0;
            for field in fields {
                match field.into_value() {
                    Field::Product(p) => name = p,
                    Field::Rating(r) => stars = r,
                }
            }
            (id, name, stars, degraded)
        }));
    }

    for (id, name, stars, degraded) in futures::future::join_all(pages).await {
        tracing::info!(id, %name, stars, degraded, "page");
    }

    dispatcher.close().await;
    Ok(())
}
