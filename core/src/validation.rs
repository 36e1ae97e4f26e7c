//! Branching eligibility rules for a submitted form response.
//!
//! [`validate`] is a pure decision function. Rules are evaluated in a fixed
//! order and the first violated rule wins; the returned message names that
//! rule. Successful validation performs no transformation, it only proves
//! consistency: [`ValidatedFormResponse`] has no other constructor, so the
//! state machine can only ever receive validator output.
//!
//! Rule order: the `uriktigeOpplysninger` cross-check runs first, then the
//! employment-situation branch in decision-table order, then the
//! `egenmeldingsdager` cross-check. Tests depend on this order.

use crate::form::{Arbeidssituasjon, JaNei, LottOgHyre, SykmeldingFormResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A submitted form violated one of the eligibility rules.
///
/// Carries the human-readable message identifying the first violated rule.
/// No state change has occurred when this is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Which rule was violated, in user-facing terms.
    pub message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A form response proven consistent with its declared employment situation.
///
/// Only [`validate`] can construct this; the field is private on purpose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedFormResponse {
    form: SykmeldingFormResponse,
}

impl ValidatedFormResponse {
    /// Borrow the underlying form.
    #[must_use]
    pub const fn form(&self) -> &SykmeldingFormResponse {
        &self.form
    }

    /// Consume the proof and take the form back out.
    #[must_use]
    pub fn into_form(self) -> SykmeldingFormResponse {
        self.form
    }
}

/// Validate a submitted form response against the branch rules.
///
/// # Errors
///
/// Returns the first violated rule as a [`ValidationError`]; later rules are
/// not evaluated.
pub fn validate(form: &SykmeldingFormResponse) -> Result<ValidatedFormResponse, ValidationError> {
    check_uriktige_opplysninger(form)?;

    match form.arbeidssituasjon.svar {
        Arbeidssituasjon::Arbeidstaker => check_arbeidstaker(form)?,
        Arbeidssituasjon::Frilanser
        | Arbeidssituasjon::Naeringsdrivende
        | Arbeidssituasjon::Jordbruker => check_selvstendig(form)?,
        Arbeidssituasjon::Fisker => check_fisker(form)?,
        Arbeidssituasjon::Arbeidsledig
        | Arbeidssituasjon::Permittert
        | Arbeidssituasjon::Annet => check_uten_arbeidsgiver(form)?,
    }

    check_egenmeldingsdager(form)?;

    Ok(ValidatedFormResponse { form: form.clone() })
}

fn check_uriktige_opplysninger(form: &SykmeldingFormResponse) -> Result<(), ValidationError> {
    if form.er_opplysningene_riktige.svar == JaNei::Nei && form.uriktige_opplysninger.is_none() {
        return Err(ValidationError::new(
            "uriktigeOpplysninger må være satt når opplysningene ikke stemmer",
        ));
    }
    Ok(())
}

fn check_arbeidstaker(form: &SykmeldingFormResponse) -> Result<(), ValidationError> {
    if form.arbeidsgiver_orgnummer.is_none() {
        return Err(ValidationError::new(
            "Arbeidsgiver er påkrevd når arbeidssituasjon er ARBEIDSTAKER",
        ));
    }
    if form.har_brukt_egenmelding.is_some() {
        return Err(ValidationError::new(
            "harBruktEgenmelding skal ikke være satt når arbeidssituasjon er ARBEIDSTAKER",
        ));
    }
    if form.egenmeldingsperioder.is_some() {
        return Err(ValidationError::new(
            "egenmeldingsperioder skal ikke være satt når arbeidssituasjon er ARBEIDSTAKER",
        ));
    }
    if form.har_forsikring.is_some() {
        return Err(ValidationError::new(
            "harForsikring skal ikke være satt når arbeidssituasjon er ARBEIDSTAKER",
        ));
    }
    Ok(())
}

fn check_selvstendig(form: &SykmeldingFormResponse) -> Result<(), ValidationError> {
    let situasjon = form.arbeidssituasjon.svar;
    if form.arbeidsgiver_orgnummer.is_some() {
        return Err(ValidationError::new(format!(
            "arbeidsgiverOrgnummer skal ikke være satt når arbeidssituasjon er {situasjon}"
        )));
    }
    if form.har_brukt_egenmelding.is_some() && form.har_forsikring.is_none() {
        return Err(ValidationError::new(
            "harForsikring er påkrevd når harBruktEgenmelding er besvart",
        ));
    }
    if form
        .har_brukt_egenmelding
        .as_ref()
        .is_some_and(|a| a.svar == JaNei::Ja)
        && form.egenmeldingsperioder.is_none()
    {
        return Err(ValidationError::new(
            "egenmeldingsperioder er påkrevd når harBruktEgenmelding er JA",
        ));
    }
    if form.har_forsikring.is_some() && form.har_brukt_egenmelding.is_none() {
        return Err(ValidationError::new(
            "harBruktEgenmelding er påkrevd når harForsikring er besvart",
        ));
    }
    Ok(())
}

fn check_fisker(form: &SykmeldingFormResponse) -> Result<(), ValidationError> {
    let Some(fisker) = form.fisker.as_ref() else {
        return Err(ValidationError::new(
            "fisker må være besvart når arbeidssituasjon er FISKER",
        ));
    };

    match fisker.lott_og_hyre.svar {
        // On wage the fisherman behaves like an employee.
        LottOgHyre::Hyre => {
            if form.arbeidsgiver_orgnummer.is_none() {
                return Err(ValidationError::new(
                    "Arbeidsgiver er påkrevd når lottOgHyre er HYRE",
                ));
            }
        }
        LottOgHyre::Lott | LottOgHyre::Begge => {
            if form.har_brukt_egenmelding.is_none() {
                return Err(ValidationError::new(
                    "harBruktEgenmelding er påkrevd når lottOgHyre er LOTT eller BEGGE",
                ));
            }
            if fisker.blad.svar == crate::form::Blad::A && form.har_forsikring.is_none() {
                return Err(ValidationError::new(
                    "harForsikring er påkrevd når blad er A",
                ));
            }
        }
    }
    Ok(())
}

fn check_uten_arbeidsgiver(form: &SykmeldingFormResponse) -> Result<(), ValidationError> {
    let situasjon = form.arbeidssituasjon.svar;
    if form.arbeidsgiver_orgnummer.is_some() {
        return Err(ValidationError::new(format!(
            "arbeidsgiverOrgnummer skal ikke være satt når arbeidssituasjon er {situasjon}"
        )));
    }
    if form.har_brukt_egenmelding.is_some() {
        return Err(ValidationError::new(format!(
            "harBruktEgenmelding skal ikke være satt når arbeidssituasjon er {situasjon}"
        )));
    }
    if form.egenmeldingsperioder.is_some() {
        return Err(ValidationError::new(format!(
            "egenmeldingsperioder skal ikke være satt når arbeidssituasjon er {situasjon}"
        )));
    }
    if form.har_forsikring.is_some() {
        return Err(ValidationError::new(format!(
            "harForsikring skal ikke være satt når arbeidssituasjon er {situasjon}"
        )));
    }
    Ok(())
}

fn check_egenmeldingsdager(form: &SykmeldingFormResponse) -> Result<(), ValidationError> {
    if form
        .har_brukt_egenmeldingsdager
        .as_ref()
        .is_some_and(|a| a.svar == JaNei::Ja)
        && !form
            .egenmeldingsdager
            .as_ref()
            .is_some_and(|a| !a.svar.is_empty())
    {
        return Err(ValidationError::new(
            "egenmeldingsdager kan ikke være tom når harBruktEgenmeldingsdager er JA",
        ));
    }
    Ok(())
}
