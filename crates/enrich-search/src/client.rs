// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Serper search API.
//!
//! One request per call. Retries are the orchestrator's job.

use std::fmt;

use async_trait::async_trait;
use enrich_config::model::SearchConfig;
use enrich_core::traits::{PluginAdapter, SearchProvider};
use enrich_core::types::{SearchHit, SearchQuery};
use enrich_core::{AdapterType, EnrichError, HealthStatus, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MISSING_FIELD: &str = "N/A";

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u8,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

impl From<OrganicResult> for SearchHit {
    fn from(r: OrganicResult) -> Self {
        let or_missing = |v: Option<String>| v.unwrap_or_else(|| MISSING_FIELD.to_string());
        Self {
            title: or_missing(r.title),
            url: or_missing(r.link),
            snippet: or_missing(r.snippet),
        }
    }
}

#[derive(Clone)]
pub struct SerperClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl fmt::Debug for SerperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerperClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl SerperClient {
    /// Builds the client. A missing API key is not an error here; every
    /// search then fails with [`ProviderError::NotConfigured`].
    pub fn new(config: &SearchConfig) -> Result<Self, EnrichError> {
        let api_key = enrich_config::resolve_secret(config.api_key.as_deref(), "SERPER_API_KEY");
        let client = reqwest::Client::builder()
            .timeout(enrich_config::secs(config.timeout_secs))
            .build()
            .map_err(|e| EnrichError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
        })
    }
}

/// Maps transport failures onto the provider error taxonomy.
pub(crate) fn map_reqwest_err(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_decode() {
        ProviderError::InvalidResponse(e.to_string())
    } else {
        ProviderError::Connection(e.to_string())
    }
}

#[async_trait]
impl PluginAdapter for SerperClient {
    fn name(&self) -> &str {
        "serper"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(match self.api_key {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("SERPER_API_KEY not configured".into()),
        })
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured(
                "SERPER_API_KEY not configured".into(),
            ));
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&SerperRequest {
                q: &query.query,
                num: query.num_results,
            })
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = response.status();
        debug!(status = %status, query = %query.query, "search response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let body: SerperResponse = response.json().await.map_err(map_reqwest_err)?;
        Ok(body.organic.into_iter().map(SearchHit::from).collect())
    }
}
