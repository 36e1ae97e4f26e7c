//! The status state machine: turns an accepted status change into a new
//! immutable [`SykmeldingStatusEvent`].
//!
//! There is deliberately no guard on the source state: any change may be
//! attempted from any current status, matching the observed behavior of the
//! platform (a send after DELETED is accepted). The one structural
//! precondition is the egenmeldingsdager amendment, which needs a current
//! SENT or CONFIRMED event to copy its tag and answers from.
//!
//! Timestamps come from the caller's clock at acceptance time; events never
//! carry caller-supplied timestamps.

use crate::event::{
    ArbeidsgiverStatus, EventSource, Shortname, Sporsmal, StatusEventTag, Svartype, SykmeldingId,
    SykmeldingStatusEvent,
};
use crate::form::{JaNei, SykmeldingFormResponse};
use crate::validation::ValidatedFormResponse;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// A requested status change, already past validation where a form is
/// involved.
#[derive(Clone, Debug)]
pub enum StatusChange {
    /// Submit the form; routes to SENT or CONFIRMED depending on the
    /// employment situation.
    Send(ValidatedFormResponse),
    /// Acknowledge an upstream rejection; no form involved.
    BekreftAvvist,
    /// Withdraw the sykmelding.
    Avbryt,
    /// Return an aborted sykmelding to the actionable pool.
    Gjenapne,
    /// Amend the self-certified days of the current SENT/CONFIRMED status.
    /// A content amendment, not a transition: the tag is unchanged.
    EndreEgenmeldingsdager(EgenmeldingsdagerEndring),
}

/// Replacement self-certified day list with its question text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EgenmeldingsdagerEndring {
    /// The new day list; empty removes the answer.
    pub dager: Vec<NaiveDate>,
    /// Question text to store with the amended answer.
    pub tekst: String,
}

/// A status change could not be applied.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The form routes to an employer but no employer reference was resolved
    /// for the chosen orgnummer.
    #[error("ingen arbeidsgiver funnet for valgt orgnummer")]
    MissingArbeidsgiver,

    /// Egenmeldingsdager can only be amended on a current SENT or CONFIRMED
    /// status.
    #[error("ingen SENDT eller BEKREFTET status å endre egenmeldingsdager på")]
    NothingToAmend,

    /// An answer value could not be encoded for storage.
    #[error("failed to encode answer value: {0}")]
    Serialization(String),
}

/// Build the status event resulting from `change`.
///
/// `current` is the latest event for the sykmelding, if any; it is only
/// consulted by the amendment. `arbeidsgiver` is the employer reference
/// resolved by the caller for the employer path of a send.
///
/// # Errors
///
/// - [`TransitionError::MissingArbeidsgiver`] when a send routes to an
///   employer and none was resolved
/// - [`TransitionError::NothingToAmend`] when amending without a current
///   SENT/CONFIRMED event
/// - [`TransitionError::Serialization`] when an answer value cannot be
///   encoded
pub fn next_event(
    sykmelding_id: &SykmeldingId,
    change: StatusChange,
    current: Option<&SykmeldingStatusEvent>,
    arbeidsgiver: Option<ArbeidsgiverStatus>,
    now: DateTime<Utc>,
) -> Result<SykmeldingStatusEvent, TransitionError> {
    match change {
        StatusChange::Send(validated) => send_event(sykmelding_id, &validated, arbeidsgiver, now),
        StatusChange::BekreftAvvist => Ok(bare_event(
            sykmelding_id,
            StatusEventTag::ConfirmedRejected,
            now,
        )),
        StatusChange::Avbryt => Ok(bare_event(sykmelding_id, StatusEventTag::Aborted, now)),
        StatusChange::Gjenapne => Ok(bare_event(sykmelding_id, StatusEventTag::Open, now)),
        StatusChange::EndreEgenmeldingsdager(endring) => {
            amend_egenmeldingsdager(sykmelding_id, &endring, current, now)
        }
    }
}

fn bare_event(
    sykmelding_id: &SykmeldingId,
    status_event: StatusEventTag,
    now: DateTime<Utc>,
) -> SykmeldingStatusEvent {
    SykmeldingStatusEvent {
        sykmelding_id: sykmelding_id.clone(),
        timestamp: now,
        status_event,
        arbeidsgiver: None,
        sporsmal: None,
        source: EventSource::User,
    }
}

fn send_event(
    sykmelding_id: &SykmeldingId,
    validated: &ValidatedFormResponse,
    arbeidsgiver: Option<ArbeidsgiverStatus>,
    now: DateTime<Utc>,
) -> Result<SykmeldingStatusEvent, TransitionError> {
    let form = validated.form();
    let sporsmal = sporsmal_list(form)?;

    let (status_event, arbeidsgiver) = if form.sends_to_arbeidsgiver() {
        let Some(arbeidsgiver) = arbeidsgiver else {
            return Err(TransitionError::MissingArbeidsgiver);
        };
        (StatusEventTag::Sent, Some(arbeidsgiver))
    } else {
        (StatusEventTag::Confirmed, None)
    };

    Ok(SykmeldingStatusEvent {
        sykmelding_id: sykmelding_id.clone(),
        timestamp: now,
        status_event,
        arbeidsgiver,
        sporsmal: Some(sporsmal),
        source: EventSource::User,
    })
}

fn amend_egenmeldingsdager(
    sykmelding_id: &SykmeldingId,
    endring: &EgenmeldingsdagerEndring,
    current: Option<&SykmeldingStatusEvent>,
    now: DateTime<Utc>,
) -> Result<SykmeldingStatusEvent, TransitionError> {
    let Some(current) = current.filter(|e| {
        matches!(
            e.status_event,
            StatusEventTag::Sent | StatusEventTag::Confirmed
        )
    }) else {
        return Err(TransitionError::NothingToAmend);
    };

    let mut sporsmal: Vec<Sporsmal> = current
        .sporsmal
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter(|s| s.shortname != Shortname::Egenmeldingsdager)
        .collect();

    if !endring.dager.is_empty() {
        sporsmal.push(Sporsmal {
            tekst: endring.tekst.clone(),
            shortname: Shortname::Egenmeldingsdager,
            svartype: Svartype::Dager,
            svar: encode(&endring.dager)?,
        });
    }

    Ok(SykmeldingStatusEvent {
        sykmelding_id: sykmelding_id.clone(),
        timestamp: now,
        status_event: current.status_event,
        arbeidsgiver: current.arbeidsgiver.clone(),
        sporsmal: Some(sporsmal),
        source: EventSource::User,
    })
}

/// Extract the ordered answer list from a validated form.
///
/// # Errors
///
/// Returns [`TransitionError::Serialization`] if a list answer cannot be
/// JSON-encoded.
pub fn sporsmal_list(form: &SykmeldingFormResponse) -> Result<Vec<Sporsmal>, TransitionError> {
    let mut sporsmal = Vec::new();

    sporsmal.push(Sporsmal {
        tekst: form.arbeidssituasjon.sporsmaltekst.clone(),
        shortname: Shortname::Arbeidssituasjon,
        svartype: Svartype::Arbeidssituasjon,
        svar: form.arbeidssituasjon.svar.as_str().to_string(),
    });

    if let Some(answer) = &form.riktig_narmeste_leder {
        // The stored question asks whether a *new* leader must be found; the
        // form asks whether the current one is correct, so the answer flips.
        let flipped = match answer.svar {
            JaNei::Ja => JaNei::Nei,
            JaNei::Nei => JaNei::Ja,
        };
        sporsmal.push(Sporsmal {
            tekst: "Skal finne ny nærmeste leder".to_string(),
            shortname: Shortname::NyNarmesteLeder,
            svartype: Svartype::JaNei,
            svar: flipped.as_str().to_string(),
        });
    }

    if let Some(answer) = &form.har_brukt_egenmelding {
        sporsmal.push(Sporsmal {
            tekst: answer.sporsmaltekst.clone(),
            shortname: Shortname::Fravaer,
            svartype: Svartype::JaNei,
            svar: answer.svar.as_str().to_string(),
        });
    }

    if let Some(answer) = &form.egenmeldingsperioder {
        sporsmal.push(Sporsmal {
            tekst: answer.sporsmaltekst.clone(),
            shortname: Shortname::Periode,
            svartype: Svartype::Perioder,
            svar: encode(&answer.svar)?,
        });
    }

    if let Some(answer) = &form.har_forsikring {
        sporsmal.push(Sporsmal {
            tekst: answer.sporsmaltekst.clone(),
            shortname: Shortname::Forsikring,
            svartype: Svartype::JaNei,
            svar: answer.svar.as_str().to_string(),
        });
    }

    if let Some(answer) = &form.egenmeldingsdager {
        sporsmal.push(Sporsmal {
            tekst: answer.sporsmaltekst.clone(),
            shortname: Shortname::Egenmeldingsdager,
            svartype: Svartype::Dager,
            svar: encode(&answer.svar)?,
        });
    }

    Ok(sporsmal)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, TransitionError> {
    serde_json::to_string(value).map_err(|e| TransitionError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Arbeidssituasjon, FormAnswer};
    use crate::validation::validate;

    fn id() -> SykmeldingId {
        SykmeldingId::new("syk-1")
    }

    fn kiwi() -> ArbeidsgiverStatus {
        ArbeidsgiverStatus {
            orgnummer: "972674818".to_string(),
            juridisk_orgnummer: Some("963743254".to_string()),
            org_navn: "Kiwi AS".to_string(),
        }
    }

    fn validated(arbeidssituasjon: Arbeidssituasjon) -> ValidatedFormResponse {
        let mut form = SykmeldingFormResponse {
            er_opplysningene_riktige: FormAnswer::new("Stemmer opplysningene?", JaNei::Ja),
            uriktige_opplysninger: None,
            arbeidssituasjon: FormAnswer::new("Jeg er sykmeldt som", arbeidssituasjon),
            arbeidsgiver_orgnummer: None,
            riktig_narmeste_leder: None,
            har_brukt_egenmelding: None,
            egenmeldingsperioder: None,
            har_forsikring: None,
            har_brukt_egenmeldingsdager: None,
            egenmeldingsdager: None,
            fisker: None,
        };
        if arbeidssituasjon == Arbeidssituasjon::Arbeidstaker {
            form.arbeidsgiver_orgnummer =
                Some(FormAnswer::new("Velg arbeidsgiver", "972674818".to_string()));
            form.riktig_narmeste_leder = Some(FormAnswer::new("Er det X som er lederen din?", JaNei::Ja));
        }
        match validate(&form) {
            Ok(v) => v,
            Err(e) => panic!("test form should validate: {e}"),
        }
    }

    #[test]
    fn send_as_arbeidstaker_produces_sent_with_arbeidsgiver() {
        let now = Utc::now();
        let event = next_event(
            &id(),
            StatusChange::Send(validated(Arbeidssituasjon::Arbeidstaker)),
            None,
            Some(kiwi()),
            now,
        );
        let event = match event {
            Ok(e) => e,
            Err(e) => panic!("send should succeed: {e}"),
        };
        assert_eq!(event.status_event, StatusEventTag::Sent);
        assert_eq!(event.timestamp, now);
        assert_eq!(event.arbeidsgiver, Some(kiwi()));
        assert_eq!(event.source, EventSource::User);

        let sporsmal = event.sporsmal.unwrap_or_default();
        assert_eq!(sporsmal[0].shortname, Shortname::Arbeidssituasjon);
        assert_eq!(sporsmal[0].svar, "ARBEIDSTAKER");
        // riktigNarmesteLeder JA flips to NY_NARMESTE_LEDER NEI.
        assert_eq!(sporsmal[1].shortname, Shortname::NyNarmesteLeder);
        assert_eq!(sporsmal[1].svar, "NEI");
    }

    #[test]
    fn send_as_frilanser_produces_confirmed_without_arbeidsgiver() {
        let event = next_event(
            &id(),
            StatusChange::Send(validated(Arbeidssituasjon::Frilanser)),
            None,
            None,
            Utc::now(),
        );
        let event = match event {
            Ok(e) => e,
            Err(e) => panic!("send should succeed: {e}"),
        };
        assert_eq!(event.status_event, StatusEventTag::Confirmed);
        assert!(event.arbeidsgiver.is_none());
        assert!(event.sporsmal.is_some());
    }

    #[test]
    fn send_to_employer_without_resolved_arbeidsgiver_fails() {
        let result = next_event(
            &id(),
            StatusChange::Send(validated(Arbeidssituasjon::Arbeidstaker)),
            None,
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(TransitionError::MissingArbeidsgiver)));
    }

    #[test]
    fn send_is_accepted_from_any_current_state() {
        // Permissive by observed design: even a deleted sykmelding accepts a
        // send; there is no source-state guard.
        let deleted = SykmeldingStatusEvent {
            sykmelding_id: id(),
            timestamp: Utc::now(),
            status_event: StatusEventTag::Deleted,
            arbeidsgiver: None,
            sporsmal: None,
            source: EventSource::System,
        };
        let result = next_event(
            &id(),
            StatusChange::Send(validated(Arbeidssituasjon::Arbeidstaker)),
            Some(&deleted),
            Some(kiwi()),
            Utc::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn avbryt_and_gjenapne_produce_bare_user_events() {
        let aborted = match next_event(&id(), StatusChange::Avbryt, None, None, Utc::now()) {
            Ok(e) => e,
            Err(e) => panic!("avbryt should succeed: {e}"),
        };
        assert_eq!(aborted.status_event, StatusEventTag::Aborted);
        assert!(aborted.sporsmal.is_none());

        let reopened =
            match next_event(&id(), StatusChange::Gjenapne, Some(&aborted), None, Utc::now()) {
                Ok(e) => e,
                Err(e) => panic!("gjenapne should succeed: {e}"),
            };
        assert_eq!(reopened.status_event, StatusEventTag::Open);
        assert_eq!(reopened.source, EventSource::User);
    }

    #[test]
    fn bekreft_avvist_is_tagged_confirmed_rejected_from_user() {
        let event = match next_event(&id(), StatusChange::BekreftAvvist, None, None, Utc::now()) {
            Ok(e) => e,
            Err(e) => panic!("bekreftAvvist should succeed: {e}"),
        };
        assert_eq!(event.status_event, StatusEventTag::ConfirmedRejected);
        assert_eq!(event.source, EventSource::User);
    }

    #[test]
    fn endre_egenmeldingsdager_keeps_tag_and_replaces_day_answer() {
        let sent = match next_event(
            &id(),
            StatusChange::Send(validated(Arbeidssituasjon::Arbeidstaker)),
            None,
            Some(kiwi()),
            Utc::now(),
        ) {
            Ok(e) => e,
            Err(e) => panic!("send should succeed: {e}"),
        };

        let dager = vec![NaiveDate::from_ymd_opt(2025, 3, 3).unwrap_or_default()];
        let amended = match next_event(
            &id(),
            StatusChange::EndreEgenmeldingsdager(EgenmeldingsdagerEndring {
                dager: dager.clone(),
                tekst: "Velg dagene du brukte egenmelding".to_string(),
            }),
            Some(&sent),
            None,
            Utc::now(),
        ) {
            Ok(e) => e,
            Err(e) => panic!("amendment should succeed: {e}"),
        };

        assert_eq!(amended.status_event, StatusEventTag::Sent);
        assert_eq!(amended.arbeidsgiver, sent.arbeidsgiver);
        let sporsmal = amended.sporsmal.unwrap_or_default();
        let dag_answer = sporsmal
            .iter()
            .find(|s| s.shortname == Shortname::Egenmeldingsdager);
        assert!(dag_answer.is_some_and(|s| s.svar.contains("2025-03-03")));
    }

    #[test]
    fn endre_egenmeldingsdager_with_empty_list_removes_answer() {
        let sent = match next_event(
            &id(),
            StatusChange::Send(validated(Arbeidssituasjon::Arbeidstaker)),
            None,
            Some(kiwi()),
            Utc::now(),
        ) {
            Ok(e) => e,
            Err(e) => panic!("send should succeed: {e}"),
        };

        let amended = match next_event(
            &id(),
            StatusChange::EndreEgenmeldingsdager(EgenmeldingsdagerEndring {
                dager: vec![],
                tekst: "Velg dagene du brukte egenmelding".to_string(),
            }),
            Some(&sent),
            None,
            Utc::now(),
        ) {
            Ok(e) => e,
            Err(e) => panic!("amendment should succeed: {e}"),
        };

        let sporsmal = amended.sporsmal.unwrap_or_default();
        assert!(
            sporsmal
                .iter()
                .all(|s| s.shortname != Shortname::Egenmeldingsdager)
        );
    }

    #[test]
    fn endre_egenmeldingsdager_requires_current_sent_or_confirmed() {
        let endring = EgenmeldingsdagerEndring {
            dager: vec![NaiveDate::from_ymd_opt(2025, 3, 3).unwrap_or_default()],
            tekst: "Velg dagene du brukte egenmelding".to_string(),
        };

        let no_current = next_event(
            &id(),
            StatusChange::EndreEgenmeldingsdager(endring.clone()),
            None,
            None,
            Utc::now(),
        );
        assert!(matches!(no_current, Err(TransitionError::NothingToAmend)));

        let aborted = bare_event(&id(), StatusEventTag::Aborted, Utc::now());
        let wrong_state = next_event(
            &id(),
            StatusChange::EndreEgenmeldingsdager(endring),
            Some(&aborted),
            None,
            Utc::now(),
        );
        assert!(matches!(wrong_state, Err(TransitionError::NothingToAmend)));
    }
}
