//! Shared handler state.

use crate::service::SykmeldingStatusService;
use std::sync::Arc;

/// State injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The status registration service.
    pub service: Arc<SykmeldingStatusService>,
}

impl AppState {
    /// Wrap a service for handler injection.
    #[must_use]
    pub fn new(service: SykmeldingStatusService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
