// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps service errors onto HTTP responses.
//!
//! Every error body carries a `detail` field. Upstream and timeout failures
//! are 503 with a `Retry-After` hint so clients can tell "retry later" from
//! "fix your request".

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use enrich_core::EnrichError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized(String),
    RateLimited(String),
    BadRequest(String),
    /// Request body failed to parse or validate.
    Unprocessable(String),
    BadGateway(String),
    /// Retryable outage. `retry_after_secs` is `None` during shutdown.
    Unavailable {
        message: String,
        retry_after_secs: Option<u64>,
    },
    Internal,
}

impl ApiError {
    pub fn from_enrich(err: EnrichError, retry_after_secs: u64) -> Self {
        match err {
            EnrichError::UpstreamUnavailable { ref provider, .. } => {
                warn!(provider = %provider, error = %err, "upstream unavailable");
                Self::Unavailable {
                    message: err.to_string(),
                    retry_after_secs: Some(retry_after_secs),
                }
            }
            EnrichError::EnrichmentTimeout { .. } => Self::Unavailable {
                message: "Enrichment timed out. Please retry.".into(),
                retry_after_secs: Some(retry_after_secs),
            },
            EnrichError::Cancelled => Self::Unavailable {
                message: "Service is shutting down".into(),
                retry_after_secs: None,
            },
            EnrichError::Validation(message) | EnrichError::InvalidPlan(message) => {
                Self::BadRequest(message)
            }
            EnrichError::Provider { message, .. } => {
                warn!(error = %message, "provider failure");
                Self::BadGateway(message)
            }
            other @ (EnrichError::Storage { .. }
            | EnrichError::Config(_)
            | EnrichError::Internal(_)) => {
                error!(error = %other, "request failed");
                Self::Internal
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthorized(detail)
            | Self::RateLimited(detail)
            | Self::BadRequest(detail)
            | Self::Unprocessable(detail)
            | Self::BadGateway(detail) => (status, Json(json!({ "detail": detail }))).into_response(),
            Self::Unavailable {
                message,
                retry_after_secs: Some(secs),
            } => {
                let body = json!({
                    "detail": {
                        "error": "upstream_unavailable",
                        "message": message,
                        "retry_after_seconds": secs,
                    }
                });
                let mut response = (status, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            Self::Unavailable {
                message,
                retry_after_secs: None,
            } => (status, Json(json!({ "detail": message }))).into_response(),
            Self::Internal => (
                status,
                Json(json!({ "detail": "Internal server error", "success": false })),
            )
                .into_response(),
        }
    }
}
