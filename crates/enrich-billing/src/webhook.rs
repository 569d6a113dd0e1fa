// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook handling with event-id deduplication.
//!
//! A processed event id is remembered for the configured TTL; a replay is
//! answered with `ignored`/`duplicate_event` and touches nothing. Events
//! without an id are always processed. Like checkout, the check and the mark
//! are separate store calls.
//!
//! The mark is written after the account change is committed. A failed mark
//! is logged and the outcome still returned, so the provider does not
//! redeliver an event that was already applied.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use enrich_core::billing::{CheckoutCompleted, WebhookEvent, WebhookEventKind};
use enrich_core::traits::PaymentProvider;
use enrich_core::{EnrichError, KvStore};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::accounts::AccountStore;
use crate::plans::Plan;

pub const DUPLICATE_EVENT: &str = "duplicate_event";

fn dedup_key(event_id: &str) -> String {
    format!("webhook:event:{event_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WebhookStatus {
    Success,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub status: WebhookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookOutcome {
    fn success(event: &str) -> Self {
        Self {
            status: WebhookStatus::Success,
            event: Some(event.to_string()),
            reason: None,
        }
    }

    fn ignored(event: &str, reason: Option<&str>) -> Self {
        Self {
            status: WebhookStatus::Ignored,
            event: Some(event.to_string()),
            reason: reason.map(str::to_string),
        }
    }
}

pub struct WebhookHandler {
    payment: Arc<dyn PaymentProvider>,
    store: Arc<dyn KvStore>,
    accounts: AccountStore,
    ttl: Duration,
}

impl WebhookHandler {
    pub fn new(
        payment: Arc<dyn PaymentProvider>,
        store: Arc<dyn KvStore>,
        accounts: AccountStore,
        ttl: Duration,
    ) -> Self {
        Self {
            payment,
            store,
            accounts,
            ttl,
        }
    }

    /// Verifies, deduplicates and applies one webhook delivery.
    ///
    /// Verification failures are [`EnrichError::Validation`] carrying
    /// "Invalid payload" or "Invalid signature".
    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, EnrichError> {
        let event = self
            .payment
            .construct_event(payload, signature_header)
            .map_err(|e| {
                warn!(error = ?e, "webhook rejected");
                enrich_prometheus::record_webhook("unknown", "rejected");
                EnrichError::Validation(e.to_string())
            })?;
        let event_type = event.event_type().to_string();

        if let Some(id) = event.id.as_deref()
            && self.store.exists(&dedup_key(id)).await?
        {
            info!(event_id = id, event_type = %event_type, "duplicate webhook ignored");
            enrich_prometheus::record_webhook(&event_type, "duplicate");
            return Ok(WebhookOutcome::ignored(&event_type, Some(DUPLICATE_EVENT)));
        }

        let outcome = self.dispatch(&event).await?;

        if let Some(id) = event.id.as_deref() {
            let processed_at = chrono::Utc::now().to_rfc3339();
            if let Err(e) = self
                .store
                .set_ex(&dedup_key(id), &processed_at, self.ttl)
                .await
            {
                error!(event_id = id, error = %e, "failed to mark webhook event processed");
            }
        }

        let label = match outcome.status {
            WebhookStatus::Success => "processed",
            WebhookStatus::Ignored => "unhandled",
        };
        enrich_prometheus::record_webhook(&event_type, label);
        Ok(outcome)
    }

    async fn dispatch(&self, event: &WebhookEvent) -> Result<WebhookOutcome, EnrichError> {
        let event_type = event.event_type();
        match &event.kind {
            WebhookEventKind::CheckoutCompleted(session) => {
                self.apply_checkout(session).await?;
                Ok(WebhookOutcome::success(event_type))
            }
            WebhookEventKind::SubscriptionDeleted { subscription_id } => {
                let downgraded = self.accounts.downgrade_to_free(subscription_id).await?;
                if !downgraded {
                    debug!("subscription deletion for unknown subscription");
                }
                Ok(WebhookOutcome::success(event_type))
            }
            WebhookEventKind::Other(kind) => {
                debug!(event_type = %kind, "unhandled webhook event type");
                Ok(WebhookOutcome::ignored(kind, None))
            }
        }
    }

    async fn apply_checkout(&self, session: &CheckoutCompleted) -> Result<(), EnrichError> {
        let (Some(email), Some(plan_name)) = (session.email.as_deref(), session.plan.as_deref())
        else {
            debug!("checkout completion without email or plan, nothing to apply");
            return Ok(());
        };

        match Plan::from_str(plan_name) {
            Ok(plan) if plan.is_paid() => {
                self.accounts
                    .upgrade_or_create(
                        email,
                        plan,
                        session.customer_id.as_deref(),
                        session.subscription_id.as_deref(),
                    )
                    .await?;
            }
            _ => warn!(plan = plan_name, "checkout completed for unknown plan, ignoring"),
        }
        Ok(())
    }
}
