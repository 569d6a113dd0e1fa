// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite key-value store and store selection.

use std::time::Duration;

use enrich_config::model::StorageConfig;
use enrich_core::{HealthStatus, KvStore, PluginAdapter};
use enrich_store::{SqliteKvStore, open_store};

fn temp_store() -> (tempfile::TempDir, SqliteKvStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("kv.db");
    let store = SqliteKvStore::new(path.display().to_string());
    (dir, store)
}

#[tokio::test]
async fn opens_lazily_and_round_trips() {
    let (dir, store) = temp_store();
    assert!(!dir.path().join("nested").join("kv.db").exists());

    store.set("apikey:enrich_x", r#"{"plan":"free"}"#).await.unwrap();
    assert!(dir.path().join("nested").join("kv.db").exists());
    assert_eq!(
        store.get("apikey:enrich_x").await.unwrap().as_deref(),
        Some(r#"{"plan":"free"}"#)
    );

    store.set("apikey:enrich_x", "updated").await.unwrap();
    assert_eq!(store.get("apikey:enrich_x").await.unwrap().as_deref(), Some("updated"));

    store.delete("apikey:enrich_x").await.unwrap();
    assert!(!store.exists("apikey:enrich_x").await.unwrap());
}

#[tokio::test]
async fn expired_rows_are_hidden_and_purged() {
    let (_dir, store) = temp_store();
    store
        .set_ex("webhook:event:evt_1", "1", Duration::from_millis(20))
        .await
        .unwrap();
    store
        .set_ex("webhook:event:evt_2", "1", Duration::from_secs(3600))
        .await
        .unwrap();
    store.set("email:a@example.com", "enrich_x").await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.get("webhook:event:evt_1").await.unwrap(), None);
    assert!(store.exists("webhook:event:evt_2").await.unwrap());

    assert_eq!(store.purge_expired().await.unwrap(), 1);
    assert_eq!(store.purge_expired().await.unwrap(), 0);
    assert!(store.exists("email:a@example.com").await.unwrap());
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.db").display().to_string();
    {
        let store = SqliteKvStore::new(path.clone());
        store.set("subscription:sub_1", "enrich_y").await.unwrap();
        store.shutdown().await.unwrap();
    }
    let reopened = SqliteKvStore::new(path);
    assert_eq!(
        reopened.get("subscription:sub_1").await.unwrap().as_deref(),
        Some("enrich_y")
    );
    assert_eq!(reopened.health_check().await.unwrap(), HealthStatus::Healthy);
}

#[tokio::test]
async fn clear_resets_state() {
    let (_dir, store) = temp_store();
    store.set("a", "1").await.unwrap();
    store.clear().await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), None);
}

#[tokio::test]
async fn open_store_selects_backend() {
    let memory = open_store(&StorageConfig::default()).await.unwrap();
    assert_eq!(memory.name(), "memory");

    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        database_path: Some(dir.path().join("kv.db").display().to_string()),
        ..Default::default()
    };
    let durable = open_store(&config).await.unwrap();
    assert_eq!(durable.name(), "sqlite");
    durable.set("k", "v").await.unwrap();
    assert_eq!(durable.get("k").await.unwrap().as_deref(), Some("v"));
}
