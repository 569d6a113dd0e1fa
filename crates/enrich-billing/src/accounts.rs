// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API keys, plans and monthly usage, kept in the key-value store.
//!
//! Layout: `apikey:{key}` holds the JSON record, `email:{email}` and
//! `subscription:{id}` index back to the key. Read-modify-write sequences
//! here are not atomic.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use enrich_core::{EnrichError, KvStore};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::plans::Plan;

const KEY_PREFIX: &str = "enrich_";
const USAGE_PERIOD_DAYS: i64 = 30;

fn apikey_key(api_key: &str) -> String {
    format!("apikey:{api_key}")
}

fn email_key(email: &str) -> String {
    format!("email:{email}")
}

fn subscription_key(subscription_id: &str) -> String {
    format!("subscription:{subscription_id}")
}

/// `enrich_` followed by 32 random bytes, URL-safe base64.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Stored state of one API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub email: String,
    pub plan: Plan,
    pub requests_used: u32,
    pub requests_limit: u32,
    pub created_at: DateTime<Utc>,
    pub resets_at: DateTime<Utc>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
}

impl ApiKeyRecord {
    fn new(email: &str, plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            plan,
            requests_used: 0,
            requests_limit: plan.requests_per_month(),
            created_at: now,
            resets_at: now + Duration::days(USAGE_PERIOD_DAYS),
            stripe_customer_id: None,
            stripe_subscription_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub api_key: String,
    pub plan: Plan,
    pub already_exists: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValidation {
    Valid { plan: Plan, remaining: u32 },
    RateLimited { plan: Plan },
}

#[derive(Clone)]
pub struct AccountStore {
    store: Arc<dyn KvStore>,
}

impl AccountStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, api_key: &str) -> Result<Option<ApiKeyRecord>, EnrichError> {
        match self.store.get(&apikey_key(api_key)).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(EnrichError::storage),
            None => Ok(None),
        }
    }

    async fn save(&self, api_key: &str, record: &ApiKeyRecord) -> Result<(), EnrichError> {
        let json = serde_json::to_string(record).map_err(EnrichError::storage)?;
        self.store.set(&apikey_key(api_key), &json).await?;
        self.store.set(&email_key(&record.email), api_key).await
    }

    pub async fn key_for_email(&self, email: &str) -> Result<Option<String>, EnrichError> {
        self.store.get(&email_key(email)).await
    }

    pub async fn key_for_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<String>, EnrichError> {
        self.store.get(&subscription_key(subscription_id)).await
    }

    /// Issues a free key, or returns the one already registered for `email`.
    pub async fn register_free(&self, email: &str) -> Result<Registration, EnrichError> {
        if let Some(api_key) = self.key_for_email(email).await?
            && let Some(record) = self.record(&api_key).await?
        {
            return Ok(Registration {
                api_key,
                plan: record.plan,
                already_exists: true,
            });
        }

        let api_key = generate_api_key();
        self.save(&api_key, &ApiKeyRecord::new(email, Plan::Free, Utc::now()))
            .await?;
        info!("registered free API key");
        Ok(Registration {
            api_key,
            plan: Plan::Free,
            already_exists: false,
        })
    }

    /// Checks a key against its quota. `None` means the key is unknown.
    pub async fn validate(&self, api_key: &str) -> Result<Option<KeyValidation>, EnrichError> {
        self.validate_at(api_key, Utc::now()).await
    }

    /// As [`validate`](Self::validate), with the usage period reset lazily
    /// when `now` is past `resets_at`.
    pub async fn validate_at(
        &self,
        api_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<KeyValidation>, EnrichError> {
        let Some(mut record) = self.record(api_key).await? else {
            return Ok(None);
        };

        if now > record.resets_at {
            debug!(plan = %record.plan, "usage period reset");
            record.requests_used = 0;
            record.resets_at = now + Duration::days(USAGE_PERIOD_DAYS);
            self.save(api_key, &record).await?;
        }

        Ok(Some(if record.requests_used >= record.requests_limit {
            KeyValidation::RateLimited { plan: record.plan }
        } else {
            KeyValidation::Valid {
                plan: record.plan,
                remaining: record.requests_limit - record.requests_used,
            }
        }))
    }

    /// Adds `count` requests to the key's usage. Unknown keys are ignored.
    pub async fn increment_usage(&self, api_key: &str, count: u32) -> Result<(), EnrichError> {
        if let Some(mut record) = self.record(api_key).await? {
            record.requests_used = record.requests_used.saturating_add(count);
            self.save(api_key, &record).await?;
        }
        Ok(())
    }

    /// Applies a completed checkout: upgrades the email's key or issues a new one.
    pub async fn upgrade_or_create(
        &self,
        email: &str,
        plan: Plan,
        customer_id: Option<&str>,
        subscription_id: Option<&str>,
    ) -> Result<String, EnrichError> {
        let existing = match self.key_for_email(email).await? {
            Some(api_key) => self.record(&api_key).await?.map(|r| (api_key, r)),
            None => None,
        };

        let (api_key, mut record, old_subscription) = match existing {
            Some((api_key, record)) => {
                let old = record.stripe_subscription_id.clone();
                (api_key, record, old)
            }
            None => (
                generate_api_key(),
                ApiKeyRecord::new(email, plan, Utc::now()),
                None,
            ),
        };

        record.plan = plan;
        record.requests_limit = plan.requests_per_month();
        record.stripe_customer_id = customer_id.map(str::to_string);
        record.stripe_subscription_id = subscription_id.map(str::to_string);
        self.save(&api_key, &record).await?;

        if let Some(old) = old_subscription.as_deref()
            && Some(old) != subscription_id
        {
            self.store.delete(&subscription_key(old)).await?;
        }
        if let Some(id) = subscription_id {
            self.store.set(&subscription_key(id), &api_key).await?;
        }

        info!(plan = %plan, "account upgraded");
        Ok(api_key)
    }

    /// Returns the subscription's key to the free plan. False when the
    /// subscription is unknown.
    pub async fn downgrade_to_free(&self, subscription_id: &str) -> Result<bool, EnrichError> {
        let Some(api_key) = self.key_for_subscription(subscription_id).await? else {
            return Ok(false);
        };
        let Some(mut record) = self.record(&api_key).await? else {
            return Ok(false);
        };

        record.plan = Plan::Free;
        record.requests_limit = Plan::Free.requests_per_month();
        record.stripe_subscription_id = None;
        self.save(&api_key, &record).await?;
        self.store.delete(&subscription_key(subscription_id)).await?;

        info!("subscription cancelled, account downgraded to free");
        Ok(true)
    }
}
