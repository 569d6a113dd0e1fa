// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment provider types: checkout sessions and typed webhook events.
//!
//! Webhook bodies are parsed once, at ingress, into [`WebhookEvent`].
//! Downstream code never touches the raw JSON.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Event type for a completed checkout.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
/// Event type for a cancelled subscription.
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Parameters for a subscription checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutParams {
    pub email: String,
    /// Plan name, echoed back in session metadata.
    pub plan: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Webhook ingress failure. Display strings are returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("Invalid payload")]
    InvalidPayload(String),
    #[error("Invalid signature")]
    InvalidSignature(String),
}

/// Fields of a completed checkout session relevant to account provisioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutCompleted {
    /// `customer_email`, falling back to `metadata.email`.
    pub email: Option<String>,
    pub plan: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// Typed payload of a webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    CheckoutCompleted(CheckoutCompleted),
    SubscriptionDeleted { subscription_id: String },
    /// Any event type this service does not act on.
    Other(String),
}

/// A verified, parsed webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Provider event id. Events without one cannot be deduplicated.
    pub id: Option<String>,
    pub kind: WebhookEventKind,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct RawCheckoutSession {
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
}

#[derive(Deserialize)]
struct RawSubscription {
    id: String,
}

impl WebhookEvent {
    /// Parses a webhook body. Signature verification happens before this.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        let kind = match raw.event_type.as_str() {
            CHECKOUT_COMPLETED => {
                let session: RawCheckoutSession = serde_json::from_value(raw.data.object)
                    .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
                let metadata = session.metadata.unwrap_or_default();
                let email = session
                    .customer_email
                    .filter(|e| !e.is_empty())
                    .or_else(|| metadata.get("email").cloned());
                WebhookEventKind::CheckoutCompleted(CheckoutCompleted {
                    email,
                    plan: metadata.get("plan").cloned(),
                    customer_id: session.customer,
                    subscription_id: session.subscription,
                })
            }
            SUBSCRIPTION_DELETED => {
                let subscription: RawSubscription = serde_json::from_value(raw.data.object)
                    .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
                WebhookEventKind::SubscriptionDeleted {
                    subscription_id: subscription.id,
                }
            }
            other => WebhookEventKind::Other(other.to_string()),
        };

        Ok(Self {
            id: raw.id.filter(|id| !id.is_empty()),
            kind,
        })
    }

    /// The provider's event type string.
    pub fn event_type(&self) -> &str {
        match &self.kind {
            WebhookEventKind::CheckoutCompleted(_) => CHECKOUT_COMPLETED,
            WebhookEventKind::SubscriptionDeleted { .. } => SUBSCRIPTION_DELETED,
            WebhookEventKind::Other(t) => t,
        }
    }
}
