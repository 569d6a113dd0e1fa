// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One enrichment: gather evidence, prompt, extract, all inside the
//! request's timeout budget. Batches fan out over the same path.

use std::sync::Arc;

use enrich_config::EnrichConfig;
use enrich_core::traits::{ModelProvider, SearchProvider};
use enrich_core::{BatchEnrichmentResponse, EnrichError, EnrichmentRequest, EnrichmentResponse};
use enrich_resilience::{BackoffPolicy, BudgetError, RetryPolicy, TimeoutBudget};
use enrich_search::SearchOrchestrator;
use futures::future::try_join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::model_call::ModelCaller;
use crate::prompt;

pub struct Enricher {
    search: SearchOrchestrator,
    model: ModelCaller,
    budget: TimeoutBudget,
    batch_max_items: usize,
}

impl Enricher {
    pub fn new(
        search: SearchOrchestrator,
        model: ModelCaller,
        budget: TimeoutBudget,
        batch_max_items: usize,
    ) -> Self {
        Self {
            search,
            model,
            budget,
            batch_max_items,
        }
    }

    /// Wires the orchestrators from configuration.
    pub fn from_config(
        config: &EnrichConfig,
        search_provider: Arc<dyn SearchProvider>,
        model_provider: Arc<dyn ModelProvider>,
    ) -> Self {
        let search_retry = RetryPolicy::new(
            config.search.retry_attempts,
            BackoffPolicy::from_secs(
                config.search.backoff_base_secs,
                config.search.backoff_jitter_secs,
            ),
        );
        let budget = TimeoutBudget::new(
            enrich_config::secs(config.enrichment.search_timeout_secs),
            enrich_config::secs(config.enrichment.total_timeout_secs),
        );
        Self::new(
            SearchOrchestrator::new(search_provider, search_retry),
            ModelCaller::from_config(model_provider, &config.anthropic),
            budget,
            config.enrichment.batch_max_items,
        )
    }

    pub fn batch_max_items(&self) -> usize {
        self.batch_max_items
    }

    pub async fn enrich(
        &self,
        request: &EnrichmentRequest,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentResponse, EnrichError> {
        let started = Instant::now();
        let data_type = request.data_type().to_string();

        let result = self
            .budget
            .enforce(async {
                let evidence = self
                    .budget
                    .search_phase(self.search.gather(request, cancel))
                    .await?;
                let user_message = prompt::user_message(request, &evidence);
                let response = self
                    .model
                    .call(prompt::SYSTEM_PROMPT, &user_message, request.data_type(), cancel)
                    .await?;
                Ok::<_, BudgetError>(response)
            })
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        enrich_prometheus::record_latency(&data_type, elapsed);

        match result {
            Ok(mut response) => {
                response.original_input = request.raw_data().to_string();
                let outcome = if response.success { "success" } else { "unresolved" };
                enrich_prometheus::record_enrichment(&data_type, outcome);
                info!(
                    data_type = %data_type,
                    confidence = response.confidence_score,
                    elapsed_secs = elapsed,
                    "enrichment completed"
                );
                Ok(response)
            }
            Err(error) => {
                enrich_prometheus::record_enrichment(&data_type, outcome_label(&error));
                Err(error)
            }
        }
    }

    /// Enriches every item concurrently.
    ///
    /// A failed item becomes a failed result; cancellation aborts the batch.
    pub async fn enrich_batch(
        &self,
        items: &[EnrichmentRequest],
        cancel: &CancellationToken,
    ) -> Result<BatchEnrichmentResponse, EnrichError> {
        if items.is_empty() || items.len() > self.batch_max_items {
            return Err(EnrichError::Validation(format!(
                "items must contain between 1 and {} entries, got {}",
                self.batch_max_items,
                items.len()
            )));
        }

        let results = try_join_all(items.iter().map(|item| async move {
            match self.enrich(item, cancel).await {
                Ok(response) => Ok(response),
                Err(EnrichError::Cancelled) => Err(EnrichError::Cancelled),
                Err(error) => {
                    warn!(data_type = %item.data_type(), error = %error, "batch item failed");
                    Ok(EnrichmentResponse::failed(item))
                }
            }
        }))
        .await?;

        Ok(BatchEnrichmentResponse::from_results(results))
    }
}

fn outcome_label(error: &EnrichError) -> &'static str {
    match error {
        EnrichError::UpstreamUnavailable { .. } => "upstream_unavailable",
        EnrichError::EnrichmentTimeout { .. } => "timeout",
        EnrichError::Cancelled => "cancelled",
        EnrichError::Validation(_) => "invalid",
        _ => "error",
    }
}
