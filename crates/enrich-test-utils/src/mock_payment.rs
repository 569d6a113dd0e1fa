// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment provider double.
//!
//! Checkout URLs are numbered per call. Webhook verification accepts any
//! signature except the literal `"invalid"`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use enrich_core::billing::{CheckoutParams, CheckoutSession, WebhookError, WebhookEvent};
use enrich_core::traits::{PaymentProvider, PluginAdapter};
use enrich_core::{AdapterType, EnrichError, HealthStatus, ProviderError};

use crate::lock::lock;

pub const INVALID_SIGNATURE: &str = "invalid";

#[derive(Default)]
pub struct MockPaymentProvider {
    counter: AtomicU64,
    sessions: Mutex<Vec<(CheckoutParams, Option<String>)>>,
    failures: Mutex<VecDeque<ProviderError>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next checkout call fails with `error`.
    pub fn fail_next(self, error: ProviderError) -> Self {
        lock(&self.failures).push_back(error);
        self
    }

    /// Number of checkout sessions requested, failures included.
    pub fn checkout_calls(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn sessions(&self) -> Vec<(CheckoutParams, Option<String>)> {
        lock(&self.sessions).clone()
    }
}

#[async_trait]
impl PluginAdapter for MockPaymentProvider {
    fn name(&self) -> &str {
        "mock-payment"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
        idempotency_key: Option<&str>,
    ) -> Result<CheckoutSession, ProviderError> {
        lock(&self.sessions).push((params.clone(), idempotency_key.map(str::to_string)));
        if let Some(error) = lock(&self.failures).pop_front() {
            return Err(error);
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            id: format!("cs_mock_{n}"),
            url: format!("https://checkout.stripe.com/mock/{n}"),
        })
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, WebhookError> {
        if signature_header == INVALID_SIGNATURE {
            return Err(WebhookError::InvalidSignature("mock rejection".into()));
        }
        WebhookEvent::parse(payload)
    }
}
