//! Custom Axum extractors.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated subject's national identity number.
///
/// The gateway in front of this service authenticates the caller and injects
/// the header; the service trusts it as-is and never parses tokens itself.
pub const FNR_HEADER: &str = "fnr";

/// The authenticated subject's fnr.
#[derive(Debug, Clone)]
pub struct Fnr(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Fnr
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(FNR_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or_else(|| ApiError::unauthorized("fnr mangler"))
    }
}
