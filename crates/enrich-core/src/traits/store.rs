// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait backing idempotency records and accounts.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EnrichError;
use crate::traits::adapter::PluginAdapter;

/// A string key-value store with optional per-key TTL.
///
/// Expired entries must read as absent. Check-then-set sequences built on
/// this trait are not atomic.
#[async_trait]
pub trait KvStore: PluginAdapter {
    /// Returns the value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichError>;

    /// Stores `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), EnrichError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), EnrichError>;

    /// Returns true if `key` holds a live value.
    async fn exists(&self, key: &str) -> Result<bool, EnrichError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Physically removes expired entries, returning how many were removed.
    ///
    /// Stores that evict lazily on read keep the default no-op.
    async fn purge_expired(&self) -> Result<usize, EnrichError> {
        Ok(0)
    }
}
