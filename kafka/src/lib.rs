//! Kafka producer for the sykmelding status event stream.
//!
//! Publishes [`StatusMessage`] envelopes as JSON, keyed by the sykmelding id.
//! Events for one sykmelding always land on the same partition, so a single
//! consumer sees them in production order. Delivery is at-least-once; the
//! producer never deduplicates.
//!
//! # Example
//!
//! ```no_run
//! use sykmelding_status_kafka::KafkaStatusPublisher;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = KafkaStatusPublisher::builder()
//!     .brokers("localhost:9092")
//!     .topic("sykmeldingstatus")
//!     .acks("all")
//!     .compression("lz4")
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use sykmelding_status_core::{PublishError, StatusMessage, StatusPublisher};

/// Kafka-backed [`StatusPublisher`].
///
/// Wraps an rdkafka [`FutureProducer`] configured for a single status topic.
/// A send that the broker does not acknowledge within the configured timeout
/// surfaces as [`PublishError::Delivery`]; the caller decides what that means
/// for the surrounding operation.
pub struct KafkaStatusPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaStatusPublisher {
    /// Create a publisher with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Delivery`] if the producer cannot be created.
    pub fn new(brokers: &str, topic: &str) -> Result<Self, PublishError> {
        Self::builder().brokers(brokers).topic(topic).build()
    }

    /// Create a builder for custom producer configuration.
    #[must_use]
    pub fn builder() -> KafkaStatusPublisherBuilder {
        KafkaStatusPublisherBuilder::default()
    }

    /// The topic this publisher writes to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Builder for a [`KafkaStatusPublisher`].
#[derive(Default)]
pub struct KafkaStatusPublisherBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
}

impl KafkaStatusPublisherBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the status topic name.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1" or "all".
    ///
    /// Default: "all". Status events are the downstream source of truth, so
    /// the producer waits for full replication by default.
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Set the compression codec: "none", "gzip", "snappy", "lz4", "zstd".
    ///
    /// Default: "none"
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the publisher.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Delivery`] if brokers or topic are missing, or
    /// if the rdkafka producer cannot be created.
    pub fn build(self) -> Result<KafkaStatusPublisher, PublishError> {
        let brokers = self.brokers.ok_or_else(|| PublishError::Delivery {
            topic: self.topic.clone().unwrap_or_default(),
            reason: "brokers not configured".to_string(),
        })?;
        let topic = self.topic.ok_or_else(|| PublishError::Delivery {
            topic: String::new(),
            reason: "topic not configured".to_string(),
        })?;

        let acks = self.acks.as_deref().unwrap_or("all");
        let compression = self.compression.as_deref().unwrap_or("none");
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));

        let producer: FutureProducer = producer_config(&brokers, acks, compression, timeout)
            .create()
            .map_err(|e| PublishError::Delivery {
                topic: topic.clone(),
                reason: format!("failed to create producer: {e}"),
            })?;

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            acks = acks,
            compression = compression,
            timeout_ms = timeout.as_millis(),
            "KafkaStatusPublisher created"
        );

        Ok(KafkaStatusPublisher {
            producer,
            topic,
            timeout,
        })
    }
}

// The broker-side delivery timeout tracks the send timeout so the producer
// gives up no later than the caller does.
fn producer_config(
    brokers: &str,
    acks: &str,
    compression: &str,
    timeout: Duration,
) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", brokers)
        .set("message.timeout.ms", timeout.as_millis().to_string())
        .set("acks", acks)
        .set("compression.type", compression);
    config
}

impl StatusPublisher for KafkaStatusPublisher {
    fn publish(
        &self,
        message: StatusMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            let payload = serde_json::to_vec(&message)
                .map_err(|e| PublishError::Serialization(e.to_string()))?;

            // Partition key: all events for one sykmelding share a partition.
            let key = message.sykmelding_id.as_str().as_bytes().to_vec();

            let record = FutureRecord::to(&self.topic).payload(&payload).key(&key);

            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %self.topic,
                        sykmelding_id = %message.sykmelding_id,
                        status = %message.status_event,
                        partition = partition,
                        offset = offset,
                        "Status message published"
                    );
                    Ok(())
                }
                Err((e, _)) => Err(PublishError::Delivery {
                    topic: self.topic.clone(),
                    reason: e.to_string(),
                }),
            }
        })
    }
}
