//! The user's status-change form response (`brukerSvar`).
//!
//! Every answer carries the question text it was shown with, so the text can
//! be persisted alongside the value in the resulting status event. Which
//! optional answers must be present or absent depends on the declared
//! employment situation; those rules live in [`crate::validation`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A question/answer pair as submitted by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnswer<T> {
    /// The question text shown to the user.
    pub sporsmaltekst: String,
    /// The answer value.
    pub svar: T,
}

impl<T> FormAnswer<T> {
    /// Convenience constructor, mostly for tests.
    pub fn new(sporsmaltekst: impl Into<String>, svar: T) -> Self {
        Self {
            sporsmaltekst: sporsmaltekst.into(),
            svar,
        }
    }
}

/// Yes/no answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JaNei {
    /// Yes.
    Ja,
    /// No.
    Nei,
}

impl JaNei {
    /// Wire name of the answer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ja => "JA",
            Self::Nei => "NEI",
        }
    }
}

impl fmt::Display for JaNei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employment-situation category; decides which sub-answers apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Arbeidssituasjon {
    /// Employee.
    Arbeidstaker,
    /// Freelancer.
    Frilanser,
    /// Self-employed.
    Naeringsdrivende,
    /// Fisherman; sub-classified by [`Blad`] and [`LottOgHyre`].
    Fisker,
    /// Farmer; validated like freelancer/self-employed.
    Jordbruker,
    /// Unemployed.
    Arbeidsledig,
    /// Temporarily laid off.
    Permittert,
    /// Anything else.
    Annet,
}

impl Arbeidssituasjon {
    /// Wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arbeidstaker => "ARBEIDSTAKER",
            Self::Frilanser => "FRILANSER",
            Self::Naeringsdrivende => "NAERINGSDRIVENDE",
            Self::Fisker => "FISKER",
            Self::Jordbruker => "JORDBRUKER",
            Self::Arbeidsledig => "ARBEIDSLEDIG",
            Self::Permittert => "PERMITTERT",
            Self::Annet => "ANNET",
        }
    }
}

impl fmt::Display for Arbeidssituasjon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user flagged as incorrect in the sykmelding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum UriktigeOpplysningerType {
    Periode,
    Sykmeldingsgrad,
    Arbeidsgiver,
    Diagnose,
    AndreOpplysninger,
}

/// A self-certified absence period before the sykmelding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Egenmeldingsperiode {
    /// First day of the period.
    pub fom: NaiveDate,
    /// Last day of the period.
    pub tom: NaiveDate,
}

/// Fisherman classification: which social-security "blad" applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Blad {
    A,
    B,
}

/// Fisherman remuneration: share of catch, wage, or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum LottOgHyre {
    Lott,
    Hyre,
    Begge,
}

/// Fisherman-specific answer section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiskerSvar {
    /// Which blad the fisherman is registered under.
    pub blad: FormAnswer<Blad>,
    /// Remuneration form; `HYRE` behaves like an employee.
    pub lott_og_hyre: FormAnswer<LottOgHyre>,
}

/// The complete form response submitted with a send.
///
/// Only [`crate::validation::validate`] may promote this to a
/// [`crate::validation::ValidatedFormResponse`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SykmeldingFormResponse {
    /// "Are the particulars correct?" Always required.
    pub er_opplysningene_riktige: FormAnswer<JaNei>,
    /// What is incorrect; required when the answer above is `NEI`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uriktige_opplysninger: Option<FormAnswer<Vec<UriktigeOpplysningerType>>>,
    /// Declared employment situation. Always required.
    pub arbeidssituasjon: FormAnswer<Arbeidssituasjon>,
    /// Chosen employer; employee path only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbeidsgiver_orgnummer: Option<FormAnswer<String>>,
    /// Whether the registered closest leader is still correct.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub riktig_narmeste_leder: Option<FormAnswer<JaNei>>,
    /// Whether self-certification was used before the sykmelding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub har_brukt_egenmelding: Option<FormAnswer<JaNei>>,
    /// The self-certified periods, when `harBruktEgenmelding` is `JA`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egenmeldingsperioder: Option<FormAnswer<Vec<Egenmeldingsperiode>>>,
    /// Voluntary insurance for the first 16 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub har_forsikring: Option<FormAnswer<JaNei>>,
    /// Whether self-certified days were used inside the sykmelding period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub har_brukt_egenmeldingsdager: Option<FormAnswer<JaNei>>,
    /// The self-certified days themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egenmeldingsdager: Option<FormAnswer<Vec<NaiveDate>>>,
    /// Fisherman section; required when the situation is `FISKER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fisker: Option<FiskerSvar>,
}

impl SykmeldingFormResponse {
    /// Whether this submission goes to an employer (`SENT`) rather than being
    /// confirmed to the welfare administration (`CONFIRMED`).
    ///
    /// Employees always send to their employer; fishermen do when on wage
    /// (`HYRE`). Everyone else confirms.
    #[must_use]
    pub fn sends_to_arbeidsgiver(&self) -> bool {
        match self.arbeidssituasjon.svar {
            Arbeidssituasjon::Arbeidstaker => true,
            Arbeidssituasjon::Fisker => self
                .fisker
                .as_ref()
                .is_some_and(|f| f.lott_og_hyre.svar == LottOgHyre::Hyre),
            _ => false,
        }
    }
}
