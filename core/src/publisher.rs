//! Publishing accepted status events to the downstream event stream.
//!
//! Every accepted event is published keyed by `sykmeldingId`, so all events
//! for one sykmelding land on the same partition and any single consumer sees
//! them in production order. Delivery is at-least-once and the publisher does
//! not deduplicate; consumers must treat a repeated `(id, timestamp, tag)`
//! tuple as a no-op.
//!
//! A publish failure is surfaced to the caller and fails the whole
//! status-registration operation; it is never silently dropped.

use crate::event::{ArbeidsgiverStatus, Sporsmal, StatusEventTag, SykmeldingId, SykmeldingStatusEvent};
use crate::form::SykmeldingFormResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from the event stream producer.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The message could not be encoded.
    #[error("failed to serialize status message: {0}")]
    Serialization(String),

    /// The transport did not accept the message within its own retry/timeout
    /// policy. No application-level retry happens on top of it.
    #[error("failed to publish to {topic}: {reason}")]
    Delivery {
        /// The topic the message was addressed to.
        topic: String,
        /// Transport-level failure description.
        reason: String,
    },
}

/// The previous employer of an unemployed/laid-off submitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidligereArbeidsgiver {
    /// Display name of the previous employer.
    pub org_navn: String,
    /// Organization number of the previous employer.
    pub orgnummer: String,
}

/// The stream envelope: a superset of all per-transition payloads, with
/// optional fields absent where a transition does not produce them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    /// The sykmelding this message concerns; also the partition key.
    pub sykmelding_id: SykmeldingId,
    /// Acceptance time of the underlying event.
    pub timestamp: DateTime<Utc>,
    /// The resulting status tag.
    pub status_event: StatusEventTag,
    /// Employer reference; SENT only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbeidsgiver: Option<ArbeidsgiverStatus>,
    /// Extracted answers; SENT/CONFIRMED only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sporsmals: Option<Vec<Sporsmal>>,
    /// The raw form response as submitted; send only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bruker_svar: Option<SykmeldingFormResponse>,
    /// Previous employer; unemployed/laid-off submissions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tidligere_arbeidsgiver: Option<TidligereArbeidsgiver>,
}

impl StatusMessage {
    /// Build the envelope for an accepted event.
    #[must_use]
    pub fn from_event(
        event: &SykmeldingStatusEvent,
        bruker_svar: Option<SykmeldingFormResponse>,
        tidligere_arbeidsgiver: Option<TidligereArbeidsgiver>,
    ) -> Self {
        Self {
            sykmelding_id: event.sykmelding_id.clone(),
            timestamp: event.timestamp,
            status_event: event.status_event,
            arbeidsgiver: event.arbeidsgiver.clone(),
            sporsmals: event.sporsmal.clone(),
            bruker_svar,
            tidligere_arbeidsgiver,
        }
    }
}

/// Abstraction over the event stream producer.
///
/// # Implementations
///
/// - `KafkaStatusPublisher` (`sykmelding-status-kafka`): production
/// - `RecordingStatusPublisher` (`sykmelding-status-testing`): tests
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` return so the publisher can be injected
/// as `Arc<dyn StatusPublisher>`.
pub trait StatusPublisher: Send + Sync {
    /// Publish one envelope, keyed by its sykmelding id.
    ///
    /// # Errors
    ///
    /// [`PublishError`] when encoding or delivery fails; the caller must
    /// treat this as a failure of the whole operation.
    fn publish(
        &self,
        message: StatusMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;
}
