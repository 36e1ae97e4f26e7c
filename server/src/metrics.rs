//! Prometheus metrics for the status service.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The Prometheus exporter could not be installed.
    #[error("failed to install metrics exporter: {0}")]
    Install(String),
}

/// Register metric descriptions and start the Prometheus scrape endpoint.
///
/// Metrics are served at `http://{addr}/metrics`.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if the recorder cannot be installed. A
/// recorder already installed by a previous call (tests) is tolerated.
pub fn install(addr: SocketAddr) -> Result<(), MetricsError> {
    register_metrics();

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(addr = %addr, "Metrics endpoint started");
            Ok(())
        }
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("already initialized") {
                tracing::warn!("Metrics recorder already initialized, skipping");
                Ok(())
            } else {
                Err(MetricsError::Install(msg))
            }
        }
    }
}

fn register_metrics() {
    describe_counter!(
        "sykmelding_status_changes_total",
        "Accepted status changes by kind"
    );
    describe_counter!(
        "sykmelding_status_rejected_total",
        "Rejected status change requests by reason"
    );
}

/// Count one accepted status change of the given kind.
pub fn record_status_change(kind: &'static str) {
    counter!("sykmelding_status_changes_total", "change" => kind).increment(1);
}

/// Count one rejected request.
pub fn record_rejection(reason: &'static str) {
    counter!("sykmelding_status_rejected_total", "reason" => reason).increment(1);
}
