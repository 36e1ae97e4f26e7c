//! # Sykmelding Status Core
//!
//! Domain model for the sykmelding (sick-leave) status lifecycle:
//!
//! - Status events and the append-only log contract ([`event`], [`store`])
//! - The user form response and its branching validation rules ([`form`], [`validation`])
//! - The status state machine that turns validated submissions into events ([`transition`])
//! - Adapter traits for the event stream and the latest-status cache
//!   ([`publisher`], [`cache`])
//! - Interfaces for external collaborators that are out of scope for this
//!   service ([`external`])
//!
//! This crate is pure: no I/O, no runtime. Adapters live in the `postgres`,
//! `kafka` and `cache` crates; deterministic fakes in `testing`.
//!
//! # Design
//!
//! The current status of a sykmelding is defined as the status event with the
//! maximum timestamp for its id. Events are immutable facts; they are never
//! mutated or deleted, only superseded. A sykmelding with no events yet is
//! implicitly `APEN`-equivalent `OPEN`.
//!
//! Validation is a pure function returning a discriminated result. Rules are
//! evaluated in a fixed order and the first violated rule wins; there is no
//! collect-all mode, so error messages are stable and testable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod clock;
pub mod event;
pub mod external;
pub mod form;
pub mod publisher;
pub mod store;
pub mod transition;
pub mod validation;

pub use cache::{CachedStatus, StatusCache};
pub use clock::{Clock, SystemClock};
pub use event::{
    ArbeidsgiverStatus, EventSource, Shortname, Sporsmal, StatusEventTag, Svartype, SykmeldingId,
    SykmeldingStatusEvent,
};
pub use external::{ArbeidsgiverLookup, ExternalError, SykmeldingRecords};
pub use form::{
    Arbeidssituasjon, Blad, Egenmeldingsperiode, FiskerSvar, FormAnswer, JaNei, LottOgHyre,
    SykmeldingFormResponse, UriktigeOpplysningerType,
};
pub use publisher::{PublishError, StatusMessage, StatusPublisher, TidligereArbeidsgiver};
pub use store::{AppendOutcome, StatusEventStore, StatusStoreError};
pub use transition::{EgenmeldingsdagerEndring, StatusChange, TransitionError};
pub use validation::{ValidatedFormResponse, ValidationError, validate};
