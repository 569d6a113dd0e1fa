// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted search provider.
//!
//! Replies are queued per exact query string. A query with nothing queued
//! gets the fallback reply, which defaults to an empty hit list.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use enrich_core::traits::{PluginAdapter, SearchProvider};
use enrich_core::types::{SearchHit, SearchQuery};
use enrich_core::{AdapterType, EnrichError, HealthStatus, ProviderError};

use crate::lock::lock;

type Reply = Result<Vec<SearchHit>, ProviderError>;

#[derive(Default)]
pub struct MockSearchProvider {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Mutex<Option<Reply>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<SearchQuery>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps this long before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues replies for `query`, consumed in order.
    pub fn script(self, query: &str, replies: Vec<Reply>) -> Self {
        lock(&self.scripts)
            .entry(query.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Reply used once a query's queue is empty.
    pub fn fallback(self, reply: Reply) -> Self {
        *lock(&self.fallback) = Some(reply);
        self
    }

    pub fn calls(&self) -> Vec<SearchQuery> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn next_reply(&self, query: &str) -> Reply {
        if let Some(reply) = lock(&self.scripts)
            .get_mut(query)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        lock(&self.fallback).clone().unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl PluginAdapter for MockSearchProvider {
    fn name(&self) -> &str {
        "mock-search"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError> {
        lock(&self.calls).push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply(&query.query)
    }
}
