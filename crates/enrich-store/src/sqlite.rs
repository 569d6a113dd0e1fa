// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed key-value store.
//!
//! The database opens lazily on first use and the handle is kept for the
//! life of the store. Expiry is stored as unix milliseconds; reads ignore
//! expired rows and [`KvStore::purge_expired`] deletes them.

use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use tokio::sync::OnceCell;
use tracing::debug;

use enrich_core::traits::{KvStore, PluginAdapter};
use enrich_core::{AdapterType, EnrichError, HealthStatus};

use crate::database::{Database, map_tr_err};

pub struct SqliteKvStore {
    path: String,
    db: OnceCell<Database>,
}

impl SqliteKvStore {
    /// Creates the store. Nothing is opened until the first operation.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            db: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn db(&self) -> Result<&Database, EnrichError> {
        self.db
            .get_or_try_init(|| Database::open(&self.path))
            .await
    }

    /// Opens and migrates the database now instead of on first use.
    pub async fn initialize(&self) -> Result<(), EnrichError> {
        self.db().await.map(|_| ())
    }

    /// Deletes every row.
    pub async fn clear(&self) -> Result<(), EnrichError> {
        self.db()
            .await?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv_store", [])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn write(&self, key: &str, value: &str, expires_at: Option<i64>) -> Result<(), EnrichError> {
        let key = key.to_string();
        let value = value.to_string();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value, expires_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        expires_at = excluded.expires_at",
                    params![key, value, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl PluginAdapter for SqliteKvStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        let db = match self.db().await {
            Ok(db) => db,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("kv store WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichError> {
        let key = key.to_string();
        let now = now_millis();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM kv_store
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                    params![key, now],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EnrichError> {
        self.write(key, value, None).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.write(key, value, Some(now_millis().saturating_add(ttl_ms)))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), EnrichError> {
        let key = key.to_string();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn purge_expired(&self) -> Result<usize, EnrichError> {
        let now = now_millis();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM kv_store WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )
            })
            .await
            .map_err(map_tr_err)
    }
}
