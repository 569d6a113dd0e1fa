// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process key-value store with lazy expiry.
//!
//! Used when no database is configured. Expired entries are dropped when
//! read, or in bulk by [`KvStore::purge_expired`].

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use enrich_core::traits::{KvStore, PluginAdapter};
use enrich_core::{AdapterType, EnrichError, HealthStatus};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&self, key: &str, value: &str, expires_at: Option<Instant>) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(HealthStatus::Degraded(
            "in-process store, state is lost on restart".into(),
        ))
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichError> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        // The read guard is released above; removal re-checks expiry in case
        // another task refreshed the key meanwhile.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EnrichError> {
        self.insert(key, value, None);
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichError> {
        self.insert(key, value, Some(Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), EnrichError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, EnrichError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}
