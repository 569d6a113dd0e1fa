// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured-extraction model provider trait.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EnrichmentResponse, ExtractionRequest};

/// A language model that returns schema-conforming enrichment output.
///
/// One call is one attempt against `request.model`. Validation re-asks
/// happen inside the call; transport retries and model fallback do not.
#[async_trait]
pub trait ModelProvider: PluginAdapter {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<EnrichmentResponse, ProviderError>;
}
