// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout idempotency and webhook deduplication against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use enrich_billing::{AccountStore, KeyValidation, Plan, WebhookHandler, WebhookStatus};
use enrich_core::{AdapterType, EnrichError, HealthStatus, KvStore, PluginAdapter, ProviderError};
use enrich_store::MemoryStore;
use enrich_test_utils::fixtures::{
    checkout_completed_event, other_event, subscription_deleted_event,
};
use enrich_test_utils::mock_payment::INVALID_SIGNATURE;
use enrich_test_utils::{MockPaymentProvider, TestHarness};

const SIG: &str = "t=1,v1=mock";

#[tokio::test]
async fn same_idempotency_key_replays_the_first_url() {
    let harness = TestHarness::builder().build();

    let first = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("order-1"))
        .await
        .unwrap();
    let second = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("order-1"))
        .await
        .unwrap();

    assert_eq!(first.checkout_url, second.checkout_url);
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(harness.payment.checkout_calls(), 1);

    let cached = harness
        .kv()
        .get("idempotency:checkout:order-1")
        .await
        .unwrap();
    assert_eq!(cached.as_deref(), Some(first.checkout_url.as_str()));
}

#[tokio::test]
async fn idempotency_key_is_forwarded_and_trimmed() {
    let harness = TestHarness::builder().build();

    harness
        .checkout
        .create_checkout("a@example.com", "basic", Some("  order-2  "))
        .await
        .unwrap();

    let (params, key) = harness.payment.sessions().remove(0);
    assert_eq!(key.as_deref(), Some("order-2"));
    assert_eq!(params.price_id, "price_basic");
    assert_eq!(params.plan, "basic");
    assert_eq!(params.success_url, "https://enrich.test/checkout/success");
    assert_eq!(params.cancel_url, "https://enrich.test/checkout/cancel");
}

#[tokio::test]
async fn checkout_without_key_always_reaches_the_provider() {
    let harness = TestHarness::builder().build();

    let first = harness
        .checkout
        .create_checkout("a@example.com", "pro", None)
        .await
        .unwrap();
    let second = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("   "))
        .await
        .unwrap();

    assert_ne!(first.checkout_url, second.checkout_url);
    assert_eq!(harness.payment.checkout_calls(), 2);
    assert_eq!(harness.payment.sessions()[1].1, None);
}

#[tokio::test]
async fn different_keys_create_distinct_sessions() {
    let harness = TestHarness::builder().build();

    let a = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("k1"))
        .await
        .unwrap();
    let b = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("k2"))
        .await
        .unwrap();

    assert_ne!(a.checkout_url, b.checkout_url);
    assert_eq!(harness.payment.checkout_calls(), 2);
}

#[tokio::test]
async fn unknown_plan_is_rejected_before_the_provider() {
    let harness = TestHarness::builder().build();

    let err = harness
        .checkout
        .create_checkout("a@example.com", "free", Some("k"))
        .await
        .unwrap_err();

    assert!(matches!(&err, EnrichError::InvalidPlan(msg) if msg.contains("basic, pro, or ultra")));
    assert_eq!(harness.payment.checkout_calls(), 0);
}

#[tokio::test]
async fn unpriced_plan_is_rejected() {
    let harness = TestHarness::builder()
        .configure(|config| config.billing.price_ultra = None)
        .build();

    let err = harness
        .checkout
        .create_checkout("a@example.com", "ultra", None)
        .await
        .unwrap_err();

    assert!(
        matches!(&err, EnrichError::InvalidPlan(msg) if msg == "Stripe price not configured for plan: ultra"),
        "{err:?}"
    );
}

#[tokio::test]
async fn provider_outage_is_upstream_and_not_cached() {
    let payment = MockPaymentProvider::new().fail_next(ProviderError::InternalServer {
        status: 503,
        message: "down".into(),
    });
    let harness = TestHarness::builder().with_payment(payment).build();

    let err = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("k"))
        .await
        .unwrap_err();
    assert!(err.is_service_unavailable(), "{err:?}");
    assert!(!harness.kv().exists("idempotency:checkout:k").await.unwrap());

    let retried = harness
        .checkout
        .create_checkout("a@example.com", "pro", Some("k"))
        .await
        .unwrap();
    assert!(!retried.cached);
    assert_eq!(harness.payment.checkout_calls(), 2);
}

#[tokio::test]
async fn provider_rejection_is_a_provider_error() {
    let payment = MockPaymentProvider::new().fail_next(ProviderError::Status {
        status: 400,
        message: "No such price".into(),
    });
    let harness = TestHarness::builder().with_payment(payment).build();

    let err = harness
        .checkout
        .create_checkout("a@example.com", "pro", None)
        .await
        .unwrap_err();

    assert!(matches!(err, EnrichError::Provider { .. }), "{err:?}");
}

#[tokio::test]
async fn duplicate_webhook_is_applied_once() {
    let harness = TestHarness::builder().build();
    let payload = checkout_completed_event(Some("evt_1"), "a@example.com", "pro", "sub_1");

    let first = harness.webhooks.handle(&payload, SIG).await.unwrap();
    assert_eq!(first.status, WebhookStatus::Success);
    assert_eq!(first.event.as_deref(), Some("checkout.session.completed"));

    let api_key = harness
        .accounts
        .key_for_email("a@example.com")
        .await
        .unwrap()
        .unwrap();
    harness.accounts.increment_usage(&api_key, 5).await.unwrap();

    let second = harness.webhooks.handle(&payload, SIG).await.unwrap();
    assert_eq!(second.status, WebhookStatus::Ignored);
    assert_eq!(second.reason.as_deref(), Some("duplicate_event"));

    let record = harness.accounts.record(&api_key).await.unwrap().unwrap();
    assert_eq!(record.plan, Plan::Pro);
    assert_eq!(record.requests_used, 5);
    assert_eq!(record.requests_limit, 2000);
    assert!(harness.kv().exists("webhook:event:evt_1").await.unwrap());
}

/// Delegates to a [`MemoryStore`] but refuses to write webhook marks.
struct MarkRejectingStore(MemoryStore);

#[async_trait]
impl PluginAdapter for MarkRejectingStore {
    fn name(&self) -> &str {
        "mark-rejecting"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl KvStore for MarkRejectingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EnrichError> {
        self.0.set(key, value).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichError> {
        if key.starts_with("webhook:event:") {
            return Err(EnrichError::storage("disk full"));
        }
        self.0.set_ex(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), EnrichError> {
        self.0.delete(key).await
    }
}

#[tokio::test]
async fn failed_mark_still_reports_the_applied_event() {
    let harness = TestHarness::builder().build();
    let store: Arc<dyn KvStore> = Arc::new(MarkRejectingStore(MemoryStore::new()));
    let accounts = AccountStore::new(store.clone());
    let webhooks = WebhookHandler::new(
        harness.payment.clone(),
        store.clone(),
        accounts.clone(),
        Duration::from_secs(60),
    );

    let payload = checkout_completed_event(Some("evt_9"), "a@example.com", "pro", "sub_9");
    let outcome = webhooks.handle(&payload, SIG).await.unwrap();

    assert_eq!(outcome.status, WebhookStatus::Success);
    let api_key = accounts.key_for_email("a@example.com").await.unwrap().unwrap();
    let record = accounts.record(&api_key).await.unwrap().unwrap();
    assert_eq!(record.plan, Plan::Pro);
    assert!(!store.exists("webhook:event:evt_9").await.unwrap());
}

#[tokio::test]
async fn checkout_upgrades_an_existing_free_key() {
    let harness = TestHarness::builder().build();
    let registration = harness.accounts.register_free("a@example.com").await.unwrap();

    let payload = checkout_completed_event(Some("evt_2"), "a@example.com", "ultra", "sub_2");
    harness.webhooks.handle(&payload, SIG).await.unwrap();

    assert_eq!(
        harness.accounts.validate(&registration.api_key).await.unwrap(),
        Some(KeyValidation::Valid {
            plan: Plan::Ultra,
            remaining: 10_000,
        })
    );
    assert_eq!(
        harness.accounts.key_for_subscription("sub_2").await.unwrap(),
        Some(registration.api_key)
    );
}

#[tokio::test]
async fn subscription_deletion_downgrades_to_free() {
    let harness = TestHarness::builder().build();
    harness
        .webhooks
        .handle(
            &checkout_completed_event(Some("evt_3"), "a@example.com", "basic", "sub_3"),
            SIG,
        )
        .await
        .unwrap();

    let outcome = harness
        .webhooks
        .handle(&subscription_deleted_event(Some("evt_4"), "sub_3"), SIG)
        .await
        .unwrap();
    assert_eq!(outcome.status, WebhookStatus::Success);

    let api_key = harness
        .accounts
        .key_for_email("a@example.com")
        .await
        .unwrap()
        .unwrap();
    let record = harness.accounts.record(&api_key).await.unwrap().unwrap();
    assert_eq!(record.plan, Plan::Free);
    assert_eq!(record.requests_limit, 50);
    assert_eq!(record.stripe_subscription_id, None);
    assert_eq!(
        harness.accounts.key_for_subscription("sub_3").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn deleting_an_unknown_subscription_is_a_no_op() {
    let harness = TestHarness::builder().build();

    let outcome = harness
        .webhooks
        .handle(&subscription_deleted_event(Some("evt_5"), "sub_missing"), SIG)
        .await
        .unwrap();

    assert_eq!(outcome.status, WebhookStatus::Success);
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn unknown_plan_in_checkout_event_changes_nothing() {
    let harness = TestHarness::builder().build();

    let outcome = harness
        .webhooks
        .handle(
            &checkout_completed_event(Some("evt_6"), "a@example.com", "platinum", "sub_6"),
            SIG,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, WebhookStatus::Success);
    assert_eq!(
        harness.accounts.key_for_email("a@example.com").await.unwrap(),
        None
    );
    assert!(harness.kv().exists("webhook:event:evt_6").await.unwrap());
}

#[tokio::test]
async fn unhandled_event_types_are_ignored() {
    let harness = TestHarness::builder().build();

    let outcome = harness
        .webhooks
        .handle(&other_event(Some("evt_7"), "invoice.paid"), SIG)
        .await
        .unwrap();

    assert_eq!(outcome.status, WebhookStatus::Ignored);
    assert_eq!(outcome.event.as_deref(), Some("invoice.paid"));
    assert_eq!(outcome.reason, None);
}

#[tokio::test]
async fn events_without_an_id_are_never_deduplicated() {
    let harness = TestHarness::builder().build();
    let payload = other_event(None, "invoice.paid");

    for _ in 0..2 {
        let outcome = harness.webhooks.handle(&payload, SIG).await.unwrap();
        assert_eq!(outcome.reason, None);
    }
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn bad_signature_is_rejected_without_side_effects() {
    let harness = TestHarness::builder().build();
    let payload = checkout_completed_event(Some("evt_8"), "a@example.com", "pro", "sub_8");

    let err = harness
        .webhooks
        .handle(&payload, INVALID_SIGNATURE)
        .await
        .unwrap_err();

    assert!(matches!(&err, EnrichError::Validation(msg) if msg == "Invalid signature"));
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let harness = TestHarness::builder().build();

    let err = harness.webhooks.handle(b"not json", SIG).await.unwrap_err();

    assert!(matches!(&err, EnrichError::Validation(msg) if msg == "Invalid payload"));
}
