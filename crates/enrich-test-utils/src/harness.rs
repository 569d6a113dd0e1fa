// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end tests.
//!
//! `TestHarness` wires the enricher and the billing services onto mock
//! providers and an in-process store. Backoff is zeroed and every paid plan
//! has a price id, so tests run fast and checkout works out of the box.

use std::sync::Arc;
use std::time::Duration;

use enrich_billing::{AccountStore, CheckoutService, PlanPrices, WebhookHandler};
use enrich_config::EnrichConfig;
use enrich_core::{EnrichError, EnrichmentRequest, EnrichmentResponse, KvStore};
use enrich_pipeline::Enricher;
use enrich_store::MemoryStore;
use tokio_util::sync::CancellationToken;

use crate::mock_model::MockModelProvider;
use crate::mock_payment::MockPaymentProvider;
use crate::mock_search::MockSearchProvider;

/// Configuration the harness starts from.
pub fn test_config() -> EnrichConfig {
    let mut config = EnrichConfig::default();
    config.server.base_url = "https://enrich.test".into();
    config.search.backoff_base_secs = 0.0;
    config.search.backoff_jitter_secs = 0.0;
    config.anthropic.backoff_base_secs = 0.0;
    config.anthropic.backoff_jitter_secs = 0.0;
    config.anthropic.fallback_models = "claude-fallback".into();
    config.billing.price_basic = Some("price_basic".into());
    config.billing.price_pro = Some("price_pro".into());
    config.billing.price_ultra = Some("price_ultra".into());
    config
}

pub struct TestHarnessBuilder {
    config: EnrichConfig,
    search: MockSearchProvider,
    model: MockModelProvider,
    payment: MockPaymentProvider,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: test_config(),
            search: MockSearchProvider::new(),
            model: MockModelProvider::new(),
            payment: MockPaymentProvider::new(),
        }
    }

    /// Adjusts the configuration before wiring.
    pub fn configure(mut self, f: impl FnOnce(&mut EnrichConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_search(mut self, search: MockSearchProvider) -> Self {
        self.search = search;
        self
    }

    pub fn with_model(mut self, model: MockModelProvider) -> Self {
        self.model = model;
        self
    }

    pub fn with_payment(mut self, payment: MockPaymentProvider) -> Self {
        self.payment = payment;
        self
    }

    pub fn build(self) -> TestHarness {
        let config = self.config;
        let store = Arc::new(MemoryStore::new());
        let kv: Arc<dyn KvStore> = store.clone();
        let search = Arc::new(self.search);
        let model = Arc::new(self.model);
        let payment = Arc::new(self.payment);

        let enricher = Arc::new(Enricher::from_config(&config, search.clone(), model.clone()));
        let accounts = AccountStore::new(kv.clone());
        let checkout = Arc::new(CheckoutService::new(
            payment.clone(),
            kv.clone(),
            PlanPrices::from_config(&config.billing),
            &config.server.base_url,
            Duration::from_secs(config.billing.checkout_ttl_secs),
        ));
        let webhooks = Arc::new(WebhookHandler::new(
            payment.clone(),
            kv,
            accounts.clone(),
            Duration::from_secs(config.billing.webhook_event_ttl_secs),
        ));

        TestHarness {
            config,
            store,
            search,
            model,
            payment,
            enricher,
            accounts,
            checkout,
            webhooks,
        }
    }
}

/// A wired service on mocks. Fields are public for assertions.
pub struct TestHarness {
    pub config: EnrichConfig,
    pub store: Arc<MemoryStore>,
    pub search: Arc<MockSearchProvider>,
    pub model: Arc<MockModelProvider>,
    pub payment: Arc<MockPaymentProvider>,
    pub enricher: Arc<Enricher>,
    pub accounts: AccountStore,
    pub checkout: Arc<CheckoutService>,
    pub webhooks: Arc<WebhookHandler>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The store as the trait object the services hold.
    pub fn kv(&self) -> Arc<dyn KvStore> {
        self.store.clone()
    }

    /// Runs one enrichment with a fresh cancellation token.
    pub async fn enrich(
        &self,
        raw_data: &str,
        data_type: &str,
    ) -> Result<EnrichmentResponse, EnrichError> {
        let request = EnrichmentRequest::new(raw_data, data_type)?;
        self.enricher
            .enrich(&request, &CancellationToken::new())
            .await
    }

    /// Drops all stored state.
    pub fn reset_store(&self) {
        self.store.clear();
    }
}
