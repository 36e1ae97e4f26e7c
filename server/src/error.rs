//! HTTP error mapping.
//!
//! Bridges [`ServiceError`] to HTTP responses via Axum's `IntoResponse`.

use crate::service::ServiceError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use sykmelding_status_core::TransitionError;

/// Application error for the HTTP surface.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => Self::not_found("sykmeldingen finnes ikke"),
            ServiceError::Validation(e) => Self::bad_request(e.to_string()),
            ServiceError::Transition(TransitionError::NothingToAmend) => {
                Self::not_found(TransitionError::NothingToAmend.to_string())
            }
            ServiceError::Transition(TransitionError::MissingArbeidsgiver) => {
                Self::bad_request(TransitionError::MissingArbeidsgiver.to_string())
            }
            ServiceError::Transition(e @ TransitionError::Serialization(_)) => {
                Self::internal("kunne ikke behandle skjemaet").with_source(e.into())
            }
            ServiceError::Store(e) => {
                Self::internal("lagring av status feilet").with_source(e.into())
            }
            ServiceError::Publish(e) => {
                Self::internal("publisering av status feilet").with_source(e.into())
            }
            ServiceError::External(e) => {
                Self::unavailable("en baktjeneste er utilgjengelig").with_source(e.into())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    // A missing, non-JSON or undeserializable body is the caller's mistake,
    // whatever rejection variant axum picked for it.
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("ugyldig eller manglende meldingskropp").with_source(rejection.into())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(status = %self.status, code = %self.code, "Request failed");
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sykmelding_status_core::ValidationError;

    #[test]
    fn display_includes_code_and_message() {
        let err = ApiError::bad_request("ugyldig skjema");
        assert_eq!(err.to_string(), "[BAD_REQUEST] ugyldig skjema");
    }

    #[test]
    fn validation_errors_map_to_400() {
        let err: ApiError = ServiceError::Validation(ValidationError {
            message: "fisker må være besvart når arbeidssituasjon er FISKER".to_string(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn nothing_to_amend_maps_to_404() {
        let err: ApiError = ServiceError::Transition(TransitionError::NothingToAmend).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_sykmelding_maps_to_404() {
        let err: ApiError = ServiceError::NotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
