// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles health and metrics, key registration, checkout, payment webhooks,
//! and single and batch enrichment.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use enrich_billing::{CheckoutOutcome, Plan, WebhookOutcome};
use enrich_core::{
    BatchEnrichmentRequest, BatchEnrichmentResponse, EnrichmentRequest, EnrichmentResponse,
    HealthStatus, PluginAdapter,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::server::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Unwraps a JSON body, reporting any rejection as 422.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))
}

fn check_email(email: &str) -> Result<(), ApiError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::Unprocessable(format!("invalid email address: {email}")))
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub store: String,
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, store) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => ("healthy", "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => ("degraded", format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => ("degraded", format!("unhealthy: {reason}")),
        Err(e) => ("degraded", format!("unhealthy: {e}")),
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store,
    })
}

/// GET /metrics
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub api_key: String,
    pub plan: Plan,
    pub requests_per_month: u32,
    pub message: &'static str,
}

/// POST /api/v1/register
///
/// Issues a free key, or returns the existing key for the email.
pub async fn post_register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let body = json_body(body)?;
    let email = body.email.trim().to_lowercase();
    check_email(&email)?;

    let registration = state
        .accounts
        .register_free(&email)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(RegisterResponse {
        requests_per_month: registration.plan.requests_per_month(),
        message: if registration.already_exists {
            "Key already exists for this email"
        } else {
            "API key created successfully"
        },
        api_key: registration.api_key,
        plan: registration.plan,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    pub email: String,
    pub plan: String,
}

/// POST /api/v1/checkout
///
/// A repeated `Idempotency-Key` replays the first checkout URL.
pub async fn post_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutOutcome>, ApiError> {
    let body = json_body(body)?;
    let email = body.email.trim().to_lowercase();
    check_email(&email)?;
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    state
        .checkout
        .create_checkout(&email, &body.plan.to_lowercase(), idempotency_key)
        .await
        .map(Json)
        .map_err(|e| state.error(e))
}

/// POST /api/v1/webhook
pub async fn post_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<Json<WebhookOutcome>, ApiError> {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return Err(ApiError::BadRequest("Missing stripe-signature header".into()));
    };

    state
        .webhooks
        .handle(&payload, signature)
        .await
        .map(Json)
        .map_err(|e| state.error(e))
}

/// POST /api/v1/enrich
pub async fn post_enrich(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<EnrichmentRequest>, JsonRejection>,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let request = json_body(body)?;
    let cancel = state.shutdown.child_token();

    let response = state
        .enricher
        .enrich(&request, &cancel)
        .await
        .map_err(|e| state.error(e))?;

    state.meter(&caller, 1).await;
    Ok(Json(response))
}

/// POST /api/v1/enrich/batch
///
/// The item count is checked before quota, then quota is required for every
/// item up front; usage is charged per item.
pub async fn post_enrich_batch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<BatchEnrichmentRequest>, JsonRejection>,
) -> Result<Json<BatchEnrichmentResponse>, ApiError> {
    let batch = json_body(body)?;
    let needed = batch.items.len();
    let max = state.enricher.batch_max_items();
    if needed == 0 || needed > max {
        return Err(ApiError::Unprocessable(format!(
            "items must contain between 1 and {max} entries, got {needed}"
        )));
    }

    if let Caller::ApiKey { remaining, .. } = &caller
        && (*remaining as usize) < needed
    {
        return Err(ApiError::RateLimited(format!(
            "Not enough requests remaining. Need {needed}, have {remaining}. Upgrade at /api/v1/checkout"
        )));
    }

    let cancel = state.shutdown.child_token();
    let response = state
        .enricher
        .enrich_batch(&batch.items, &cancel)
        .await
        .map_err(|e| state.error(e))?;

    state
        .meter(&caller, u32::try_from(needed).unwrap_or(u32::MAX))
        .await;
    Ok(Json(response))
}

impl AppState {
    fn error(&self, err: enrich_core::EnrichError) -> ApiError {
        ApiError::from_enrich(err, self.retry_after_secs)
    }

    /// Charges usage to a metered caller. Failures are only logged.
    async fn meter(&self, caller: &Caller, count: u32) {
        if let Some(key) = caller.metered_key()
            && let Err(e) = self.accounts.increment_usage(key, count).await
        {
            warn!(error = %e, "failed to record usage");
        }
    }
}
