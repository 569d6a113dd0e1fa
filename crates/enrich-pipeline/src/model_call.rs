// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model calls with per-model retry and an ordered fallback chain.
//!
//! Each attempt runs under its own deadline. Retryable failures back off and
//! retry the same model until its attempts are spent, then the next model in
//! the chain is tried. A fatal failure ends the sequence at once.

use std::sync::Arc;
use std::time::Duration;

use enrich_config::model::AnthropicConfig;
use enrich_core::traits::ModelProvider;
use enrich_core::types::{ExtractionRequest, PromptMessage};
use enrich_core::{DataType, EnrichError, EnrichmentResponse, ProviderError};
use enrich_resilience::{
    AttemptOutcome, BackoffPolicy, ModelChain, RetryError, RetryPolicy, classify_model_error,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const LLM_PROVIDER: &str = "LLM provider";
const UPSTREAM_MESSAGE: &str =
    "LLM provider is temporarily unavailable. Please retry in a few seconds.";

pub struct ModelCaller {
    provider: Arc<dyn ModelProvider>,
    chain: ModelChain,
    retry: RetryPolicy,
    call_timeout: Duration,
    max_tokens: u32,
    validation_retries: u32,
}

impl ModelCaller {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        chain: ModelChain,
        retry: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            chain,
            retry,
            call_timeout,
            max_tokens: 2000,
            validation_retries: 2,
        }
    }

    pub fn from_config(provider: Arc<dyn ModelProvider>, config: &AnthropicConfig) -> Self {
        let retry = RetryPolicy::new(
            config.retry_attempts,
            BackoffPolicy::from_secs(config.backoff_base_secs, config.backoff_jitter_secs),
        );
        Self {
            max_tokens: config.max_tokens,
            validation_retries: config.validation_retries,
            ..Self::new(
                provider,
                ModelChain::new(&config.model, &config.fallback_models),
                retry,
                enrich_config::secs(config.call_timeout_secs),
            )
        }
    }

    pub fn chain(&self) -> &ModelChain {
        &self.chain
    }

    /// Extracts a validated result, walking the fallback chain as needed.
    pub async fn call(
        &self,
        system_prompt: &str,
        user_message: &str,
        data_type: DataType,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentResponse, EnrichError> {
        let mut last_error: Option<ProviderError> = None;

        for model in self.chain.iter() {
            let request = ExtractionRequest {
                model: model.to_string(),
                max_tokens: self.max_tokens,
                system_prompt: system_prompt.to_string(),
                messages: vec![PromptMessage::user(user_message)],
                schema: EnrichmentResponse::json_schema(),
                data_type,
                validation_retries: self.validation_retries,
            };

            match self.try_model(&request, cancel).await {
                Ok(response) => {
                    debug!(model, "model call succeeded");
                    return Ok(response);
                }
                Err(RetryError::Cancelled) => return Err(EnrichError::Cancelled),
                Err(RetryError::Fatal(error)) => {
                    warn!(model, error = %error, "model call failed fatally");
                    return Err(EnrichError::Provider {
                        message: format!("model {model} failed: {error}"),
                        source: Some(Box::new(error)),
                    });
                }
                Err(RetryError::Exhausted { attempts, last }) => {
                    warn!(model, attempts, error = %last, "model retries exhausted, falling back");
                    enrich_prometheus::record_fallback(model);
                    last_error = Some(last);
                }
            }
        }

        enrich_prometheus::record_upstream_unavailable("llm");
        Err(match last_error {
            Some(last) => EnrichError::upstream(LLM_PROVIDER, UPSTREAM_MESSAGE, Some(last)),
            None => EnrichError::upstream(
                LLM_PROVIDER,
                "LLM provider is temporarily unavailable.",
                None,
            ),
        })
    }

    async fn try_model(
        &self,
        request: &ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentResponse, RetryError<ProviderError>> {
        let provider = &self.provider;
        let call_timeout = self.call_timeout;
        self.retry
            .run("llm", cancel, move |_attempt| async move {
                match tokio::time::timeout(call_timeout, provider.extract(request)).await {
                    Err(_) => AttemptOutcome::Retryable(ProviderError::Timeout),
                    Ok(Ok(response)) => AttemptOutcome::Success(response),
                    Ok(Err(e)) if classify_model_error(&e).is_retryable() => {
                        AttemptOutcome::Retryable(e)
                    }
                    Ok(Err(e)) => AttemptOutcome::Fatal(e),
                }
            })
            .await
    }
}
