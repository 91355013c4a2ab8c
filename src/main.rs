use std::{error::Error, sync::Arc, time::Duration};

use chrono::NaiveDate;
use tokio::time::sleep;
use travel_saga::{
    activities::logging::LoggingActivities,
    config::SagaConfig,
    definitions::booking_request::BookingRequest,
    metrics::InMemoryMetrics,
    persisters::in_memory::InMemoryPersister,
    registry::SagaRegistry,
};

// book and confirm a trip to Paris
// book a trip to Rome where transport fails and everything is cancelled
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config = SagaConfig::load()?;
    let persister = InMemoryPersister::new(config.lock_timeout());
    let metrics = InMemoryMetrics::new();
    let travel_date = NaiveDate::from_ymd_opt(2025, 6, 1).ok_or("invalid travel date")?;

    let registry = SagaRegistry::new(
        Arc::new(LoggingActivities::default()),
        persister.clone(),
        config.clone(),
        Arc::new(metrics.clone()),
    );
    let confirmed = registry
        .start_booking(BookingRequest::new("u1", "Paris", travel_date))
        .await?;
    sleep(Duration::from_secs(1)).await;
    let delivery = registry.confirm_booking("u1").await?;
    log::info!("Confirmation for u1: {delivery:?}");
    println!("u1 finished: {}", confirmed.await??);

    let failing = SagaRegistry::new(
        Arc::new(LoggingActivities::failing_transport()),
        persister,
        config,
        Arc::new(metrics.clone()),
    );
    let compensated = failing
        .start_booking(BookingRequest::new("u2", "Rome", travel_date))
        .await?;
    println!("u2 finished: {}", compensated.await??);

    println!(
        "started {}, confirmed {}, compensated {}",
        metrics.counter("saga_started"),
        metrics.counter("outcome.confirmed"),
        metrics.counter("outcome.compensated_on_failure")
    );
    Ok(())
}
