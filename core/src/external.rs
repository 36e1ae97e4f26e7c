//! Interfaces for external collaborators.
//!
//! These services are out of scope for the status core and consumed
//! read-only: the primary sykmelding record store (ownership lookups) and
//! the employer/organization service (employer enrichment). The core trusts
//! the authenticated subject identifier handed to it per request and only
//! needs these narrow views.

use crate::event::{ArbeidsgiverStatus, SykmeldingId};
use crate::publisher::TidligereArbeidsgiver;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// An external collaborator could not answer.
#[derive(Debug, Error)]
pub enum ExternalError {
    /// The upstream service is unreachable or answered with an error.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the primary sykmelding record store, used to decide
/// whether a sykmelding exists for the calling subject.
pub trait SykmeldingRecords: Send + Sync {
    /// Whether `sykmelding_id` exists and belongs to the subject `fnr`.
    ///
    /// # Errors
    ///
    /// [`ExternalError`] when the record store cannot be reached.
    fn owned_by(
        &self,
        sykmelding_id: SykmeldingId,
        fnr: String,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ExternalError>> + Send + '_>>;
}

/// Read-only view of the employer/organization service.
pub trait ArbeidsgiverLookup: Send + Sync {
    /// Resolve the subject's employment at `orgnummer` into a structured
    /// employer reference, if the subject works there.
    ///
    /// # Errors
    ///
    /// [`ExternalError`] when the employer service cannot be reached.
    fn arbeidsgiver(
        &self,
        fnr: String,
        orgnummer: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ArbeidsgiverStatus>, ExternalError>> + Send + '_>>;

    /// The subject's most recent previous employer, used to enrich
    /// unemployed/laid-off submissions.
    ///
    /// # Errors
    ///
    /// [`ExternalError`] when the employer service cannot be reached.
    fn tidligere_arbeidsgiver(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TidligereArbeidsgiver>, ExternalError>> + Send + '_>>;
}
