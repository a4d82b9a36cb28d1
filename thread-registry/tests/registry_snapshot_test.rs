//! Integration tests for ThreadRegistry snapshot import/export.
//!
//! Covers: export → import round trip, missing snapshot file, legacy duplicate buckets,
//! corrupt snapshots, and save_thread_and_export.

use std::fs;

use tempfile::TempDir;
use thread_registry::{RegistryError, Snapshot, ThreadRegistry};

/// **Test: Export then import into a fresh registry reproduces every mapping.**
#[tokio::test]
async fn test_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("threads.json");

    let registry = ThreadRegistry::new();
    registry.save_thread("alpha_bot", "42", "thread_x").await;
    registry.save_thread("alpha_bot", "43", "thread_y").await;
    registry.save_thread("beta_bot", "42", "thread_z").await;
    registry.export(&path).await.unwrap();

    let restored = ThreadRegistry::load(&path).await.unwrap();

    assert_eq!(restored.entries().await, registry.entries().await);
    assert!(!dir.path().join("threads.json.tmp").exists());
}

/// **Test: Importing a path that does not exist yields an empty registry without error.**
#[tokio::test]
async fn test_import_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let registry = ThreadRegistry::new();
    registry.save_thread("alpha_bot", "1", "stale").await;

    registry
        .import(dir.path().join("does-not-exist.json"))
        .await
        .unwrap();

    assert!(registry.is_empty().await);
}

/// **Test: Snapshots written with one bucket per saved thread load as merged buckets.**
#[tokio::test]
async fn test_import_legacy_append_only_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("threads.json");
    fs::write(
        &path,
        r#"{"Threads":[{"BotName":"alpha_bot","Threads":{"42":"thread_1"}},{"BotName":"alpha_bot","Threads":{"43":"thread_2"}}]}"#,
    )
    .unwrap();

    let registry = ThreadRegistry::load(&path).await.unwrap();

    assert_eq!(registry.bot_names().await, vec!["alpha_bot"]);
    assert_eq!(registry.get_thread("alpha_bot", "42").await.as_deref(), Some("thread_1"));
    assert_eq!(registry.get_thread("alpha_bot", "43").await.as_deref(), Some("thread_2"));
}

/// **Test: A corrupt snapshot is a Serialization error and leaves the registry untouched.**
#[tokio::test]
async fn test_import_corrupt_snapshot_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("threads.json");
    fs::write(&path, r#"{"Threads":[{"BotName":"alpha_bot","#).unwrap();

    let registry = ThreadRegistry::new();
    registry.save_thread("alpha_bot", "1", "kept").await;
    let err = registry.import(&path).await.unwrap_err();

    assert!(matches!(err, RegistryError::Serialization { .. }));
    assert_eq!(registry.get_thread("alpha_bot", "1").await.as_deref(), Some("kept"));
}

/// **Test: Exporting into a directory that does not exist is an Io error.**
#[tokio::test]
async fn test_export_into_missing_directory_errors() {
    let dir = TempDir::new().unwrap();
    let registry = ThreadRegistry::new();

    let err = registry
        .export(dir.path().join("missing").join("threads.json"))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::Io { .. }));
}

/// **Test: save_thread_and_export rewrites the whole snapshot including the new mapping.**
#[tokio::test]
async fn test_save_thread_and_export_rewrites_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("threads.json");
    let registry = ThreadRegistry::new();
    registry.save_thread("alpha_bot", "1", "thread_1").await;

    registry
        .save_thread_and_export("beta_bot", "42", "thread_42", &path)
        .await
        .unwrap();

    let snapshot: Snapshot = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(snapshot.len(), 2);
    let beta = snapshot
        .buckets
        .iter()
        .find(|b| b.bot_name == "beta_bot")
        .unwrap();
    assert_eq!(beta.threads["42"], "thread_42");
}
