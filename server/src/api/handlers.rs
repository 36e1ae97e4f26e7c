//! Request handlers for the status endpoints.
//!
//! Every status change returns `202 Accepted`: the event is durably appended
//! and published before the response, but downstream read models catch up
//! asynchronously.

use crate::api::extractors::Fnr;
use crate::api::state::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sykmelding_status_core::{
    EgenmeldingsdagerEndring, SykmeldingFormResponse, SykmeldingId, SykmeldingStatusEvent,
};

const EGENMELDINGSDAGER_TEKST: &str = "Velg dagene du brukte egenmelding";

/// `POST /api/v2/sykmeldinger/{id}/send`
pub async fn send(
    State(state): State<AppState>,
    Path(sykmelding_id): Path<String>,
    Fnr(fnr): Fnr,
    form: Result<Json<SykmeldingFormResponse>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(form) = form?;
    state
        .service
        .send(fnr, SykmeldingId::new(sykmelding_id), form)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/v2/sykmeldinger/{id}/bekreftAvvist`
pub async fn bekreft_avvist(
    State(state): State<AppState>,
    Path(sykmelding_id): Path<String>,
    Fnr(fnr): Fnr,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .bekreft_avvist(fnr, SykmeldingId::new(sykmelding_id))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/v2/sykmeldinger/{id}/avbryt`
pub async fn avbryt(
    State(state): State<AppState>,
    Path(sykmelding_id): Path<String>,
    Fnr(fnr): Fnr,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .avbryt(fnr, SykmeldingId::new(sykmelding_id))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/v2/sykmeldinger/{id}/gjenapne`
pub async fn gjenapne(
    State(state): State<AppState>,
    Path(sykmelding_id): Path<String>,
    Fnr(fnr): Fnr,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .gjenapne(fnr, SykmeldingId::new(sykmelding_id))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Body of the egenmeldingsdager amendment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndreEgenmeldingsdagerRequest {
    /// The replacement day list; empty removes the answer.
    pub dager: Vec<NaiveDate>,
    /// Question text to store with the amended answer.
    #[serde(default)]
    pub tekst: Option<String>,
}

/// `POST /api/v2/sykmeldinger/{id}/endre-egenmeldingsdager`
pub async fn endre_egenmeldingsdager(
    State(state): State<AppState>,
    Path(sykmelding_id): Path<String>,
    Fnr(fnr): Fnr,
    request: Result<Json<EndreEgenmeldingsdagerRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request?;
    state
        .service
        .endre_egenmeldingsdager(
            fnr,
            SykmeldingId::new(sykmelding_id),
            EgenmeldingsdagerEndring {
                dager: request.dager,
                tekst: request
                    .tekst
                    .unwrap_or_else(|| EGENMELDINGSDAGER_TEKST.to_string()),
            },
        )
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `GET /api/v2/sykmeldinger/{id}/status`
///
/// Returns the latest status event, or 404 when no event has been recorded
/// yet (the sykmelding is implicitly open).
pub async fn status(
    State(state): State<AppState>,
    Path(sykmelding_id): Path<String>,
    Fnr(fnr): Fnr,
) -> Result<Json<SykmeldingStatusEvent>, ApiError> {
    let latest = state
        .service
        .current_status(fnr, SykmeldingId::new(sykmelding_id))
        .await?;

    latest
        .map(Json)
        .ok_or_else(|| ApiError::not_found("ingen status registrert"))
}

/// `GET /health`
#[allow(clippy::unused_async)]
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// `GET /ready`
///
/// Readiness is the same as liveness here: the service holds no warm-up
/// state, and backend trouble surfaces per-request instead.
#[allow(clippy::unused_async)]
pub async fn ready() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ready")
}
