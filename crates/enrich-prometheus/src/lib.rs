// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the enrichment service.
//!
//! The orchestrators record through [`recording`]; the gateway renders the
//! text exposition format on `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use enrich_core::traits::PluginAdapter;
use enrich_core::{AdapterType, EnrichError, HealthStatus};

pub use recording::{
    record_enrichment, record_fallback, record_idempotency_hit, record_latency, record_retry,
    record_upstream_unavailable, record_webhook,
};

/// Owns the handle of the process-wide Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Fails if another recorder is already installed in this process.
    pub fn new() -> Result<Self, EnrichError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            EnrichError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;
        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Wraps an existing handle without touching the global recorder.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Current metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}
