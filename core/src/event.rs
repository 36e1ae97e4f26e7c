//! Status events: the immutable facts this service records about a sykmelding.
//!
//! A [`SykmeldingStatusEvent`] is created exclusively by the state machine in
//! [`crate::transition`] after validation; it is never built directly from raw
//! HTTP input. Once appended to the log it is never mutated or deleted, only
//! superseded by a newer event for the same id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a sykmelding record.
///
/// The medical record itself is owned by an external collaborator; this
/// service only appends status events referencing it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SykmeldingId(String);

impl SykmeldingId {
    /// Create a sykmelding id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SykmeldingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SykmeldingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SykmeldingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The status a sykmelding is in after an event.
///
/// `OPEN` is also the implicit status of a freshly registered sykmelding with
/// no events yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusEventTag {
    /// Actionable by the user; initial state, and the result of a reopen.
    Open,
    /// Sent to the employer.
    Sent,
    /// Confirmed to the welfare administration (no employer involved).
    Confirmed,
    /// Withdrawn by the user.
    Aborted,
    /// Lapsed without user action.
    Expired,
    /// Removed upstream.
    Deleted,
    /// The user acknowledged an upstream rejection.
    ConfirmedRejected,
}

impl StatusEventTag {
    /// Stable wire/storage name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Sent => "SENT",
            Self::Confirmed => "CONFIRMED",
            Self::Aborted => "ABORTED",
            Self::Expired => "EXPIRED",
            Self::Deleted => "DELETED",
            Self::ConfirmedRejected => "CONFIRMED_REJECTED",
        }
    }

    /// Parse a stored tag name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "SENT" => Some(Self::Sent),
            "CONFIRMED" => Some(Self::Confirmed),
            "ABORTED" => Some(Self::Aborted),
            "EXPIRED" => Some(Self::Expired),
            "DELETED" => Some(Self::Deleted),
            "CONFIRMED_REJECTED" => Some(Self::ConfirmedRejected),
            _ => None,
        }
    }
}

impl fmt::Display for StatusEventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a status event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Submitted by the sykmelding owner.
    User,
    /// Produced by the platform itself (expiry, deletion).
    System,
}

/// Structured employer reference carried by `SENT` events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbeidsgiverStatus {
    /// Organization number of the employing unit.
    pub orgnummer: String,
    /// Organization number of the legal entity, when different.
    pub juridisk_orgnummer: Option<String>,
    /// Display name of the employer.
    pub org_navn: String,
}

/// Identifies which form question an answer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shortname {
    /// Employment-situation category.
    Arbeidssituasjon,
    /// Whether the listed closest leader is correct.
    NyNarmesteLeder,
    /// Whether self-certification was used before the sykmelding.
    Fravaer,
    /// Self-certified absence periods.
    Periode,
    /// Voluntary insurance for the first 16 days.
    Forsikring,
    /// Self-certified days inside the sykmelding period.
    Egenmeldingsdager,
}

/// Wire type of an answer value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Svartype {
    /// One of the employment-situation categories.
    Arbeidssituasjon,
    /// A JSON list of from/to periods.
    Perioder,
    /// "JA" or "NEI".
    JaNei,
    /// A JSON list of dates.
    Dager,
}

/// One collected question/answer pair, in submission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sporsmal {
    /// The question text shown to the user.
    pub tekst: String,
    /// Which question this is.
    pub shortname: Shortname,
    /// How `svar` is encoded.
    pub svartype: Svartype,
    /// The answer value; JSON-encoded for list types.
    pub svar: String,
}

/// One immutable status fact for a sykmelding.
///
/// Events for a given id are strictly ordered by `timestamp`; the current
/// status is the event with the maximum timestamp. The timestamp is assigned
/// by the service at acceptance time, never taken from the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SykmeldingStatusEvent {
    /// The sykmelding this event belongs to.
    pub sykmelding_id: SykmeldingId,
    /// Acceptance time; orders the per-id log.
    pub timestamp: DateTime<Utc>,
    /// The resulting status.
    pub status_event: StatusEventTag,
    /// Employer reference; present only on `SENT`.
    pub arbeidsgiver: Option<ArbeidsgiverStatus>,
    /// Collected answers; present on `SENT`/`CONFIRMED`.
    pub sporsmal: Option<Vec<Sporsmal>>,
    /// Who produced the event.
    pub source: EventSource,
}

impl fmt::Display for SykmeldingStatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SykmeldingStatusEvent {{ id: {}, status: {}, at: {} }}",
            self.sykmelding_id, self.status_event, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tag_round_trips_through_wire_name() {
        for tag in [
            StatusEventTag::Open,
            StatusEventTag::Sent,
            StatusEventTag::Confirmed,
            StatusEventTag::Aborted,
            StatusEventTag::Expired,
            StatusEventTag::Deleted,
            StatusEventTag::ConfirmedRejected,
        ] {
            assert_eq!(StatusEventTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(StatusEventTag::parse("BOGUS"), None);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn status_tag_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&StatusEventTag::ConfirmedRejected).unwrap();
        assert_eq!(json, "\"CONFIRMED_REJECTED\"");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn event_serializes_with_camel_case_field_names() {
        let event = SykmeldingStatusEvent {
            sykmelding_id: SykmeldingId::new("abc-123"),
            timestamp: Utc::now(),
            status_event: StatusEventTag::Sent,
            arbeidsgiver: Some(ArbeidsgiverStatus {
                orgnummer: "972674818".to_string(),
                juridisk_orgnummer: None,
                org_navn: "Kiwi AS".to_string(),
            }),
            sporsmal: None,
            source: EventSource::User,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["sykmeldingId"], "abc-123");
        assert_eq!(json["statusEvent"], "SENT");
        assert_eq!(json["arbeidsgiver"]["orgNavn"], "Kiwi AS");
        assert_eq!(json["source"], "user");
    }

    #[test]
    fn sykmelding_id_display_matches_inner() {
        let id = SykmeldingId::new("id-1");
        assert_eq!(id.to_string(), "id-1");
        assert_eq!(id.as_str(), "id-1");
    }
}
