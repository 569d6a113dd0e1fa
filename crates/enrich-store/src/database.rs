// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite connection setup.
//!
//! All statements run on tokio-rusqlite's single background thread.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use enrich_core::EnrichError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// An open, migrated SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path`, enables WAL, and
    /// applies migrations.
    pub async fn open(path: &str) -> Result<Self, EnrichError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(EnrichError::storage)?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| EnrichError::storage(format!("failed to open {path}: {e}")))?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<(), String> {
            crate::migrations::run_migrations(conn).map_err(|e| e.to_string())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "SQLite database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Converts a tokio-rusqlite failure into a storage error.
pub fn map_tr_err<E: Display>(e: tokio_rusqlite::Error<E>) -> EnrichError {
    EnrichError::storage(e.to_string())
}
