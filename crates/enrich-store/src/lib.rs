// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value stores behind [`enrich_core::KvStore`].
//!
//! [`SqliteKvStore`] is the durable store; [`MemoryStore`] is the in-process
//! fallback used when no database path is configured.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use std::sync::Arc;

use enrich_config::model::StorageConfig;
use enrich_core::{EnrichError, KvStore};
use tracing::{info, warn};

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteKvStore;

/// Builds the store selected by `config`.
///
/// The SQLite database is opened eagerly here so a bad path fails startup.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KvStore>, EnrichError> {
    match config.database_path.as_deref() {
        Some(path) => {
            let store = SqliteKvStore::new(path);
            store.initialize().await?;
            info!(path, "using SQLite key-value store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("no storage.database_path configured, using in-process store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
