use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Every way a single lookup can fail.
///
/// The `Display` output is the short human-readable summary; diagnostics such as
/// the upstream status and body ride along as fields for operators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Invalid identifier {0:?}: expected a non-empty string of digits")]
    InvalidInput(String),

    #[error("Rate limit exceeded. Try again later.")]
    RateLimited,

    #[error("No user found for identifier {0}")]
    NotFound(String),

    /// Upstream refused the call for billing reasons; the caller can still link out.
    #[error("Directory quota exhausted; view the profile at {fallback_url}")]
    QuotaExceeded { fallback_url: String },

    #[error("Directory service rejected our credentials (HTTP {status})")]
    UpstreamAuthError { status: u16 },

    #[error("Directory service returned an unexpected response (HTTP {status})")]
    UpstreamError { status: u16, body: String },

    #[error("Directory service returned a malformed record: {0}")]
    UpstreamMalformed(String),

    #[error("Could not reach the directory service: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LookupError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::InvalidInput(_) => "invalid_input",
            LookupError::RateLimited => "rate_limited",
            LookupError::NotFound(_) => "not_found",
            LookupError::QuotaExceeded { .. } => "quota_exceeded",
            LookupError::UpstreamAuthError { .. } => "upstream_auth_error",
            LookupError::UpstreamError { .. } => "upstream_error",
            LookupError::UpstreamMalformed(_) => "upstream_malformed",
            LookupError::TransportError(_) => "transport_error",
            LookupError::ConfigurationError(_) => "configuration_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LookupError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            LookupError::NotFound(_) => StatusCode::NOT_FOUND,
            LookupError::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            LookupError::UpstreamAuthError { .. }
            | LookupError::UpstreamError { .. }
            | LookupError::UpstreamMalformed(_) => StatusCode::BAD_GATEWAY,
            LookupError::TransportError(_) => StatusCode::GATEWAY_TIMEOUT,
            LookupError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status();
        // upstream bodies stay in the logs, callers only see the status
        let (fallback_url, upstream_status) = match &self {
            LookupError::QuotaExceeded { fallback_url } => (Some(fallback_url.clone()), None),
            LookupError::UpstreamAuthError { status } | LookupError::UpstreamError { status, .. } => {
                (None, Some(*status))
            }
            _ => (None, None),
        };

        let body = Json(ErrorResponse {
            error: self.kind(),
            message: self.to_string(),
            fallback_url,
            upstream_status,
        });

        (status, body).into_response()
    }
}
