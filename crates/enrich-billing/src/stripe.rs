// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stripe adapter: hosted checkout sessions and webhook verification.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use enrich_config::model::BillingConfig;
use enrich_core::billing::{CheckoutParams, CheckoutSession, WebhookError, WebhookEvent};
use enrich_core::traits::{PaymentProvider, PluginAdapter};
use enrich_core::{AdapterType, EnrichError, HealthStatus, ProviderError};
use serde::Deserialize;
use tracing::debug;

use crate::signature::SignatureVerifier;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MISSING_KEY: &str = "STRIPE_SECRET_KEY not configured";

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

pub struct StripeClient {
    client: reqwest::Client,
    secret_key: Option<String>,
    api_base: String,
    verifier: Option<SignatureVerifier>,
}

impl fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[redacted]"))
            .field("api_base", &self.api_base)
            .field("webhook_verification", &self.verifier.is_some())
            .finish()
    }
}

impl StripeClient {
    pub fn new(config: &BillingConfig) -> Result<Self, EnrichError> {
        let secret_key =
            enrich_config::resolve_secret(config.stripe_secret_key.as_deref(), "STRIPE_SECRET_KEY");
        let verifier =
            enrich_config::resolve_secret(config.webhook_secret.as_deref(), "STRIPE_WEBHOOK_SECRET")
                .map(|secret| SignatureVerifier::new(secret, config.webhook_tolerance_secs));
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| EnrichError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            secret_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            verifier,
        })
    }
}

fn session_form(params: &CheckoutParams) -> Vec<(&'static str, &str)> {
    vec![
        ("mode", "subscription"),
        ("payment_method_types[0]", "card"),
        ("line_items[0][price]", params.price_id.as_str()),
        ("line_items[0][quantity]", "1"),
        ("success_url", params.success_url.as_str()),
        ("cancel_url", params.cancel_url.as_str()),
        ("customer_email", params.email.as_str()),
        ("metadata[plan]", params.plan.as_str()),
        ("metadata[email]", params.email.as_str()),
    ]
}

fn map_reqwest_err(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Connection(e.to_string())
    }
}

#[async_trait]
impl PluginAdapter for StripeClient {
    fn name(&self) -> &str {
        "stripe"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(match (&self.secret_key, &self.verifier) {
            (Some(_), Some(_)) => HealthStatus::Healthy,
            (Some(_), None) => HealthStatus::Degraded("STRIPE_WEBHOOK_SECRET not configured".into()),
            (None, _) => HealthStatus::Unhealthy(MISSING_KEY.into()),
        })
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
        idempotency_key: Option<&str>,
    ) -> Result<CheckoutSession, ProviderError> {
        let Some(secret_key) = self.secret_key.as_deref() else {
            return Err(ProviderError::NotConfigured(MISSING_KEY.into()));
        };

        let body = serde_urlencoded::to_string(session_form(params))
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to encode form: {e}")))?;

        let mut request = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(secret_key)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await.map_err(map_reqwest_err)?;
        let status = response.status();
        debug!(status = %status, "checkout session response received");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<StripeErrorBody>(&text) {
                Ok(body) => format!(
                    "{}: {}",
                    body.error.kind.unwrap_or_else(|| "api_error".into()),
                    body.error.message.unwrap_or_default()
                ),
                Err(_) => text,
            };
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let url = session.url.ok_or_else(|| {
            ProviderError::InvalidResponse("checkout session has no url".into())
        })?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, WebhookError> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            WebhookError::InvalidSignature("STRIPE_WEBHOOK_SECRET not configured".into())
        })?;
        verifier.verify(payload, signature_header)?;
        WebhookEvent::parse(payload)
    }
}
