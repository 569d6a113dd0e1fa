// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment provider trait.

use async_trait::async_trait;

use crate::billing::{CheckoutParams, CheckoutSession, WebhookError, WebhookEvent};
use crate::error::ProviderError;
use crate::traits::adapter::PluginAdapter;

/// Checkout creation and webhook verification against a payment processor.
#[async_trait]
pub trait PaymentProvider: PluginAdapter {
    /// Creates a subscription checkout session.
    ///
    /// `idempotency_key` is forwarded to the provider when present.
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
        idempotency_key: Option<&str>,
    ) -> Result<CheckoutSession, ProviderError>;

    /// Verifies the signature header and parses the event body.
    fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, WebhookError>;
}
