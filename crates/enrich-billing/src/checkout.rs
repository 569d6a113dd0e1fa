// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout session creation with caller-keyed idempotency.
//!
//! A request carrying an idempotency token replays the URL produced for the
//! first request with that token until the cache entry expires. The
//! check-then-set is not atomic: concurrent first requests with the same
//! token may both reach the provider. The token is also forwarded to the
//! provider as its own idempotency key.

use std::sync::Arc;
use std::time::Duration;

use enrich_core::billing::CheckoutParams;
use enrich_core::traits::PaymentProvider;
use enrich_core::{EnrichError, KvStore};
use enrich_resilience::classify_payment_error;
use serde::Serialize;
use tracing::{info, warn};

use crate::plans::{Plan, PlanPrices};

pub const PAYMENT_PROVIDER: &str = "Payment provider";

fn cache_key(token: &str) -> String {
    format!("idempotency:checkout:{token}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOutcome {
    pub checkout_url: String,
    /// True when the URL was replayed from the idempotency cache.
    #[serde(skip)]
    pub cached: bool,
}

pub struct CheckoutService {
    payment: Arc<dyn PaymentProvider>,
    store: Arc<dyn KvStore>,
    prices: PlanPrices,
    success_url: String,
    cancel_url: String,
    ttl: Duration,
}

impl CheckoutService {
    /// `base_url` is the public URL the provider redirects back to.
    pub fn new(
        payment: Arc<dyn PaymentProvider>,
        store: Arc<dyn KvStore>,
        prices: PlanPrices,
        base_url: &str,
        ttl: Duration,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            payment,
            store,
            prices,
            success_url: format!("{base}/checkout/success"),
            cancel_url: format!("{base}/checkout/cancel"),
            ttl,
        }
    }

    pub async fn create_checkout(
        &self,
        email: &str,
        plan: &str,
        idempotency_key: Option<&str>,
    ) -> Result<CheckoutOutcome, EnrichError> {
        let plan = Plan::parse_paid(plan)?;
        let price_id = self.prices.price_id(plan).ok_or_else(|| {
            EnrichError::InvalidPlan(format!("Stripe price not configured for plan: {plan}"))
        })?;

        let token = idempotency_key.map(str::trim).filter(|t| !t.is_empty());

        if let Some(token) = token {
            match self.store.get(&cache_key(token)).await {
                Ok(Some(url)) => {
                    info!(plan = %plan, "checkout replayed from idempotency cache");
                    enrich_prometheus::record_idempotency_hit("checkout");
                    return Ok(CheckoutOutcome {
                        checkout_url: url,
                        cached: true,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "idempotency cache read failed"),
            }
        }

        let params = CheckoutParams {
            email: email.to_string(),
            plan: plan.to_string(),
            price_id: price_id.to_string(),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
        };

        let session = self
            .payment
            .create_checkout_session(&params, token)
            .await
            .map_err(|e| {
                if classify_payment_error(&e).is_retryable() {
                    warn!(error = %e, "payment provider unavailable");
                    enrich_prometheus::record_upstream_unavailable("payment");
                    EnrichError::upstream(
                        PAYMENT_PROVIDER,
                        "Payment provider is temporarily unavailable. Please retry shortly.",
                        Some(e),
                    )
                } else {
                    warn!(error = %e, "checkout session creation failed");
                    EnrichError::Provider {
                        message: "Failed to create checkout session".into(),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        if let Some(token) = token
            && let Err(e) = self.store.set_ex(&cache_key(token), &session.url, self.ttl).await
        {
            warn!(error = %e, "idempotency cache write failed");
        }

        info!(plan = %plan, session = %session.id, "checkout session created");
        Ok(CheckoutOutcome {
            checkout_url: session.url,
            cached: false,
        })
    }
}
