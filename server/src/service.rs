//! The status registration service.
//!
//! One write path for every status change: verify the sykmelding belongs to
//! the caller, validate where a form is involved, build the next event,
//! append it durably, publish it to the stream, then refresh the cache.
//!
//! Ordering matters. The append is the commit point; a publish failure after
//! the append fails the request so the caller retries and the stream catches
//! up (the duplicate append is absorbed by the log). The cache write comes
//! last and is best-effort, so cache trouble can never fail a registration.

use crate::metrics;
use std::sync::Arc;
use sykmelding_status_core::{
    Arbeidssituasjon, ArbeidsgiverLookup, ArbeidsgiverStatus, Clock, EgenmeldingsdagerEndring,
    ExternalError, PublishError, StatusCache, StatusChange, StatusEventStore, StatusEventTag,
    StatusMessage, StatusPublisher, StatusStoreError, SykmeldingFormResponse, SykmeldingId,
    SykmeldingRecords, SykmeldingStatusEvent, TidligereArbeidsgiver, TransitionError,
    ValidationError, transition, validate,
};
use thiserror::Error;

/// A status change request could not be completed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No sykmelding with this id exists for the caller.
    #[error("sykmeldingen finnes ikke")]
    NotFound,

    /// The submitted form violates a validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The state machine rejected the change.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The durable log failed.
    #[error(transparent)]
    Store(#[from] StatusStoreError),

    /// The event stream did not accept the event.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// An external collaborator could not answer.
    #[error(transparent)]
    External(#[from] ExternalError),
}

/// Registers status changes and serves the current status.
#[derive(Clone)]
pub struct SykmeldingStatusService {
    store: Arc<dyn StatusEventStore>,
    publisher: Arc<dyn StatusPublisher>,
    cache: Arc<dyn StatusCache>,
    records: Arc<dyn SykmeldingRecords>,
    arbeidsgivere: Arc<dyn ArbeidsgiverLookup>,
    clock: Arc<dyn Clock>,
}

impl SykmeldingStatusService {
    /// Wire the service with its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn StatusEventStore>,
        publisher: Arc<dyn StatusPublisher>,
        cache: Arc<dyn StatusCache>,
        records: Arc<dyn SykmeldingRecords>,
        arbeidsgivere: Arc<dyn ArbeidsgiverLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            publisher,
            cache,
            records,
            arbeidsgivere,
            clock,
        }
    }

    /// Submit the user's form; routes to SENT or CONFIRMED depending on the
    /// employment situation.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for a foreign or unknown sykmelding,
    /// [`ServiceError::Validation`] for a rule violation, and the transport
    /// variants for infrastructure trouble.
    pub async fn send(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
        form: SykmeldingFormResponse,
    ) -> Result<(), ServiceError> {
        self.ensure_owned(&sykmelding_id, &fnr).await?;
        let validated = validate(&form)?;

        let arbeidsgiver = self.resolve_arbeidsgiver(&fnr, &form).await?;
        let tidligere = self
            .resolve_tidligere_arbeidsgiver(&fnr, &sykmelding_id, &form)
            .await?;

        let current = self.store.latest(sykmelding_id.clone()).await?;
        let event = transition::next_event(
            &sykmelding_id,
            StatusChange::Send(validated),
            current.as_ref(),
            arbeidsgiver,
            self.clock.now(),
        )?;

        let kind = match event.status_event {
            StatusEventTag::Sent => "sendt",
            _ => "bekreftet",
        };
        let message = StatusMessage::from_event(&event, Some(form), tidligere);
        self.commit(event, message).await?;
        metrics::record_status_change(kind);
        Ok(())
    }

    /// Acknowledge an upstream rejection.
    ///
    /// # Errors
    ///
    /// See [`ServiceError`].
    pub async fn bekreft_avvist(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
    ) -> Result<(), ServiceError> {
        self.bare_change(fnr, sykmelding_id, StatusChange::BekreftAvvist, "bekreftet_avvist")
            .await
    }

    /// Withdraw the sykmelding.
    ///
    /// # Errors
    ///
    /// See [`ServiceError`].
    pub async fn avbryt(&self, fnr: String, sykmelding_id: SykmeldingId) -> Result<(), ServiceError> {
        self.bare_change(fnr, sykmelding_id, StatusChange::Avbryt, "avbrutt")
            .await
    }

    /// Return the sykmelding to the actionable pool.
    ///
    /// # Errors
    ///
    /// See [`ServiceError`].
    pub async fn gjenapne(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
    ) -> Result<(), ServiceError> {
        self.bare_change(fnr, sykmelding_id, StatusChange::Gjenapne, "gjenapnet")
            .await
    }

    /// Amend the self-certified days of the current SENT/CONFIRMED status.
    ///
    /// # Errors
    ///
    /// [`TransitionError::NothingToAmend`] (wrapped) when the current status
    /// is not SENT or CONFIRMED; otherwise see [`ServiceError`].
    pub async fn endre_egenmeldingsdager(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
        endring: EgenmeldingsdagerEndring,
    ) -> Result<(), ServiceError> {
        self.ensure_owned(&sykmelding_id, &fnr).await?;

        let current = self.store.latest(sykmelding_id.clone()).await?;
        let event = transition::next_event(
            &sykmelding_id,
            StatusChange::EndreEgenmeldingsdager(endring),
            current.as_ref(),
            None,
            self.clock.now(),
        )?;

        let message = StatusMessage::from_event(&event, None, None);
        self.commit(event, message).await?;
        metrics::record_status_change("egenmeldingsdager_endret");
        Ok(())
    }

    /// The caller's current status for the sykmelding.
    ///
    /// Reads cache-aside: a fresh cache entry wins only when it is strictly
    /// newer than the durable answer; on a timestamp tie the durable store
    /// wins. `None` means no event yet, which readers treat as OPEN.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for a foreign or unknown sykmelding,
    /// [`ServiceError::Store`] when the durable log fails.
    pub async fn current_status(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
    ) -> Result<Option<SykmeldingStatusEvent>, ServiceError> {
        self.ensure_owned(&sykmelding_id, &fnr).await?;

        let durable = self.store.latest(sykmelding_id.clone()).await?;
        let cached = self.cache.get(sykmelding_id).await;

        Ok(crate::read_model::freshest(durable, cached))
    }

    async fn bare_change(
        &self,
        fnr: String,
        sykmelding_id: SykmeldingId,
        change: StatusChange,
        kind: &'static str,
    ) -> Result<(), ServiceError> {
        self.ensure_owned(&sykmelding_id, &fnr).await?;

        let event = transition::next_event(&sykmelding_id, change, None, None, self.clock.now())?;
        let message = StatusMessage::from_event(&event, None, None);
        self.commit(event, message).await?;
        metrics::record_status_change(kind);
        Ok(())
    }

    async fn commit(
        &self,
        event: SykmeldingStatusEvent,
        message: StatusMessage,
    ) -> Result<(), ServiceError> {
        self.store.append(event.clone()).await?;
        self.publisher.publish(message).await?;
        self.cache.put(event).await;
        Ok(())
    }

    async fn ensure_owned(
        &self,
        sykmelding_id: &SykmeldingId,
        fnr: &str,
    ) -> Result<(), ServiceError> {
        let owned = self
            .records
            .owned_by(sykmelding_id.clone(), fnr.to_string())
            .await?;
        if owned {
            Ok(())
        } else {
            metrics::record_rejection("not_found");
            Err(ServiceError::NotFound)
        }
    }

    async fn resolve_arbeidsgiver(
        &self,
        fnr: &str,
        form: &SykmeldingFormResponse,
    ) -> Result<Option<ArbeidsgiverStatus>, ServiceError> {
        if !form.sends_to_arbeidsgiver() {
            return Ok(None);
        }
        // Validation guarantees an orgnummer on the employer path.
        let Some(orgnummer) = form.arbeidsgiver_orgnummer.as_ref().map(|a| a.svar.clone()) else {
            return Ok(None);
        };
        Ok(self
            .arbeidsgivere
            .arbeidsgiver(fnr.to_string(), orgnummer)
            .await?)
    }

    async fn resolve_tidligere_arbeidsgiver(
        &self,
        fnr: &str,
        sykmelding_id: &SykmeldingId,
        form: &SykmeldingFormResponse,
    ) -> Result<Option<TidligereArbeidsgiver>, ServiceError> {
        match form.arbeidssituasjon.svar {
            Arbeidssituasjon::Arbeidsledig | Arbeidssituasjon::Permittert => Ok(self
                .arbeidsgivere
                .tidligere_arbeidsgiver(fnr.to_string(), sykmelding_id.clone())
                .await?),
            _ => Ok(None),
        }
    }
}
