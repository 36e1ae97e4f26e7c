//! Integration tests for [`KafkaStatusPublisher`].
//!
//! Requires a running Kafka-compatible broker:
//!
//! ```bash
//! docker run -d --name status-redpanda -p 9092:9092 \
//!     redpandadata/redpanda:latest redpanda start \
//!     --overprovisioned --smp 1 --memory 1G
//! cargo test -p sykmelding-status-kafka -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use sykmelding_status_core::{
    EventSource, StatusEventTag, StatusMessage, StatusPublisher, SykmeldingId,
    SykmeldingStatusEvent,
};
use sykmelding_status_kafka::KafkaStatusPublisher;

fn brokers() -> String {
    std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string())
}

#[tokio::test]
#[ignore]
async fn publishes_status_message() {
    let publisher = KafkaStatusPublisher::new(&brokers(), "sykmeldingstatus-test").unwrap();

    let event = SykmeldingStatusEvent {
        sykmelding_id: SykmeldingId::new(uuid::Uuid::new_v4().to_string()),
        timestamp: Utc::now(),
        status_event: StatusEventTag::Aborted,
        arbeidsgiver: None,
        sporsmal: None,
        source: EventSource::User,
    };
    let message = StatusMessage::from_event(&event, None, None);

    publisher.publish(message).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn repeated_publish_succeeds() {
    let publisher = KafkaStatusPublisher::new(&brokers(), "sykmeldingstatus-test").unwrap();

    let event = SykmeldingStatusEvent {
        sykmelding_id: SykmeldingId::new(uuid::Uuid::new_v4().to_string()),
        timestamp: Utc::now(),
        status_event: StatusEventTag::Open,
        arbeidsgiver: None,
        sporsmal: None,
        source: EventSource::System,
    };

    // At-least-once: the producer accepts duplicates, consumers deduplicate.
    for _ in 0..2 {
        let message = StatusMessage::from_event(&event, None, None);
        publisher.publish(message).await.unwrap();
    }
}
