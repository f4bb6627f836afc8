//! # Example: trip_planner
//!
//! Builds a trip plan from five independent providers. Any provider may fail or be
//! slow; the plan is still returned, with defaults in the degraded sections.
//!
//! Shows how to:
//! - Start heterogeneous branches with [`Aggregator::run_branch`] and join them.
//! - Pick fallbacks per branch, fixed or computed from the failure reason.
//! - Race redundant providers with [`Aggregator::first_ok`].
//! - Attach the built-in [`LogWriter`] to see branch events in `tracing`.
//!
//! ## Flow
//! ```text
//! plan("LAX")
//!   ├─► accommodations ─┐
//!   ├─► weather        ─┤  (each with its own deadline and fallback)
//!   ├─► events         ─┼─► tokio::join! ─► TripPlan
//!   ├─► recommendation ─┤
//!   └─► transportation ─┘
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example trip_planner --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use fanvisor::{Aggregator, AggregatorConfig, FallbackPolicy, LogWriter, Subscribe, TaskError};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Weather {
    temperature: i32,
    condition: String,
}

#[derive(Debug)]
struct TripPlan {
    airport: String,
    accommodations: Vec<String>,
    weather: Option<Weather>,
    events: Vec<String>,
    recommendation: String,
    transportation: Option<String>,
}

async fn fetch_accommodations(airport: String) -> Result<Vec<String>, TaskError> {
    sleep(Duration::from_millis(40)).await;
    Ok(vec![format!("{airport} Plaza"), format!("{airport} Inn")])
}

async fn fetch_weather(_airport: String) -> Result<Weather, TaskError> {
    // Provider is overloaded today.
    sleep(Duration::from_millis(800)).await;
    Ok(Weather {
        temperature: 24,
        condition: "sunny".into(),
    })
}

async fn fetch_events(airport: String) -> Result<Vec<String>, TaskError> {
    sleep(Duration::from_millis(60)).await;
    Err(TaskError::fail(format!("events service has no data for {airport}")))
}

async fn fetch_recommendation(airport: String) -> Result<String, TaskError> {
    sleep(Duration::from_millis(30)).await;
    Ok(format!("try the tacos near {airport}"))
}

async fn shuttle(provider: &'static str, latency_ms: u64) -> Result<String, TaskError> {
    sleep(Duration::from_millis(latency_ms)).await;
    if provider == "cheap-rides" {
        return Err(TaskError::fail("cheap-rides is down"));
    }
    Ok(format!("{provider} shuttle"))
}

async fn plan(agg: &Aggregator, airport: &str) -> TripPlan {
    let ap = airport.to_string();

    let accommodations = agg.run_branch(
        "accommodations",
        { let ap = ap.clone(); move || fetch_accommodations(ap) },
        FallbackPolicy::default_value().with_timeout(Duration::from_millis(300)),
    );
    let weather = agg.run_branch(
        "weather",
        { let ap = ap.clone(); move || async move { fetch_weather(ap).await.map(Some) } },
        FallbackPolicy::value(None).with_timeout(Duration::from_millis(200)),
    );
    let events = agg.run_branch(
        "events",
        { let ap = ap.clone(); move || fetch_events(ap) },
        FallbackPolicy::default_value(),
    );
    let recommendation = agg.run_branch(
        "recommendation",
        { let ap = ap.clone(); move || fetch_recommendation(ap) },
        FallbackPolicy::with(|reason: &TaskError| {
            if reason.is_timeout() {
                "recommendations are slow today".to_string()
            } else {
                "no recommendation".to_string()
            }
        }),
    );

    let shuttles: Vec<_> = [("cheap-rides", 10), ("metro-link", 50), ("air-express", 90)]
        .into_iter()
        .map(|(provider, latency_ms)| move || shuttle(provider, latency_ms))
        .collect();
    let transportation = agg.first_ok(shuttles, Some(Duration::from_millis(250)));

    let (accommodations, weather, events, recommendation, transportation) =
        tokio::join!(accommodations, weather, events, recommendation, transportation);

    TripPlan {
        airport: ap,
        accommodations: accommodations.into_value(),
        weather: weather.into_value(),
        events: events.into_value(),
        recommendation: recommendation.into_value(),
        transportation: transportation.ok(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let agg = Aggregator::builder(AggregatorConfig {
        default_timeout: Duration::from_millis(500),
        ..AggregatorConfig::default()
    })
    .with_subscribers(subs)
    .build()?;

    let trip = plan(&agg, "LAX").await;
    tracing::info!(airport = %trip.airport, hotels = ?trip.accommodations, events = ?trip.events, "trip plan ready");
    match &trip.weather {
        Some(w) => tracing::info!(temperature = w.temperature, condition = %w.condition, "weather"),
        None => tracing::info!("weather unavailable"),
    }
    tracing::info!(recommendation = %trip.recommendation, transportation = ?trip.transportation, "extras");

    // Let the subscriber drain its queue before exiting.
    sleep(Duration::from_millis(50)).await;
    Ok(())
}
