// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted model provider with a per-model reply queue and a call log.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use enrich_core::traits::{ModelProvider, PluginAdapter};
use enrich_core::types::ExtractionRequest;
use enrich_core::{AdapterType, EnrichError, EnrichmentResponse, HealthStatus, ProviderError};

use crate::fixtures;
use crate::lock::lock;

#[derive(Debug, Clone)]
pub enum ModelReply {
    Respond(EnrichmentResponse),
    Fail(ProviderError),
    /// Never completes; exercises per-call deadlines.
    Hang,
}

/// Models with an empty queue answer with [`fixtures::low_confidence`].
#[derive(Default)]
pub struct MockModelProvider {
    scripts: Mutex<HashMap<String, VecDeque<ModelReply>>>,
    calls: Mutex<Vec<ExtractionRequest>>,
}

impl MockModelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, model: &str, replies: Vec<ModelReply>) -> Self {
        lock(&self.scripts)
            .entry(model.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<ExtractionRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Models in call order, one entry per attempt.
    pub fn models_called(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.model.clone()).collect()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.model == model).count()
    }
}

#[async_trait]
impl PluginAdapter for MockModelProvider {
    fn name(&self) -> &str {
        "mock-model"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Model
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<EnrichmentResponse, ProviderError> {
        lock(&self.calls).push(request.clone());
        let reply = lock(&self.scripts)
            .get_mut(&request.model)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(ModelReply::Respond(response)) => Ok(response),
            Some(ModelReply::Fail(error)) => Err(error),
            Some(ModelReply::Hang) => std::future::pending().await,
            None => Ok(fixtures::low_confidence(request.data_type)),
        }
    }
}
