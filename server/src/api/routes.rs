//! Route table.

use crate::api::handlers;
use crate::api::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/api/v2/sykmeldinger/:id/send", post(handlers::send))
        .route(
            "/api/v2/sykmeldinger/:id/bekreftAvvist",
            post(handlers::bekreft_avvist),
        )
        .route("/api/v2/sykmeldinger/:id/avbryt", post(handlers::avbryt))
        .route("/api/v2/sykmeldinger/:id/gjenapne", post(handlers::gjenapne))
        .route(
            "/api/v2/sykmeldinger/:id/endre-egenmeldingsdager",
            post(handlers::endre_egenmeldingsdager),
        )
        .route("/api/v2/sykmeldinger/:id/status", get(handlers::status))
        .with_state(state)
}
