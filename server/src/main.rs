//! Sykmelding status HTTP server.

use std::sync::Arc;
use std::time::Duration;
use sykmelding_status_cache::RedisStatusCache;
use sykmelding_status_core::SystemClock;
use sykmelding_status_kafka::KafkaStatusPublisher;
use sykmelding_status_postgres::{
    PostgresArbeidsgiverLookup, PostgresStatusStore, PostgresSykmeldingRecords,
};
use sykmelding_status_server::{AppState, Config, SykmeldingStatusService, metrics, router};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sykmelding_status_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sykmelding status server");

    let config = Config::from_env();
    info!(
        postgres_url = %config.postgres.url,
        kafka_brokers = %config.kafka.brokers,
        redis_url = %config.redis.url,
        "Configuration loaded"
    );

    metrics::install(format!("{}:{}", config.server.metrics_host, config.server.metrics_port).parse()?)?;

    info!("Connecting to event log database...");
    let store = PostgresStatusStore::connect(&config.postgres.url, config.postgres.max_connections)
        .await?;
    store.ensure_schema().await?;
    info!("Event log connected");

    info!("Connecting to external lookup database...");
    let lookup_pool = sqlx::PgPool::connect(&config.postgres.url).await?;
    let records = PostgresSykmeldingRecords::from_pool(lookup_pool.clone());
    let arbeidsgivere = PostgresArbeidsgiverLookup::from_pool(lookup_pool);
    info!("External lookups connected");

    info!("Creating status event producer...");
    let publisher = KafkaStatusPublisher::builder()
        .brokers(&config.kafka.brokers)
        .topic(&config.kafka.topic)
        .acks(&config.kafka.acks)
        .compression(&config.kafka.compression)
        .build()?;
    info!("Producer created");

    info!("Connecting to status cache...");
    let cache = RedisStatusCache::new(
        &config.redis.url,
        Duration::from_secs(config.redis.ttl_seconds),
    )
    .await?;
    info!("Cache connected");

    let service = SykmeldingStatusService::new(
        Arc::new(store),
        Arc::new(publisher),
        Arc::new(cache),
        Arc::new(records),
        Arc::new(arbeidsgivere),
        Arc::new(SystemClock),
    );

    let app = router(AppState::new(service));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
