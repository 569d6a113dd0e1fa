// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search provider adapter trait.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SearchHit, SearchQuery};

/// A web search backend.
///
/// Implementations make a single attempt per call; retry and backoff are
/// applied by the caller.
#[async_trait]
pub trait SearchProvider: PluginAdapter {
    /// Runs one search and returns the organic hits in provider order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError>;
}
