// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for credential reuse, rotation and failure handling.

use chrono::Utc;
use segment_tracker::error::{CredentialRefreshError, CredentialStoreError};
use segment_tracker::services::{
    CredentialManager, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
use std::sync::Arc;

mod common;
use common::{credential, FakeExchange, ReadOnlyCredentialStore};

fn manager(
    exchange: &Arc<FakeExchange>,
    store: &Arc<MemoryCredentialStore>,
) -> CredentialManager {
    CredentialManager::new(exchange.clone(), store.clone())
}

#[tokio::test]
async fn test_valid_persisted_credential_is_reused() {
    let stored = credential("A1", "R1", Utc::now().timestamp() + 3600);
    let store = Arc::new(MemoryCredentialStore::new(Some(stored.clone())));
    let exchange = Arc::new(FakeExchange::new());

    let result = manager(&exchange, &store)
        .get_valid_credential("seed")
        .await
        .unwrap();

    assert_eq!(result, stored);
    assert!(exchange.calls().is_empty(), "no refresh call expected");
    assert_eq!(store.snapshot(), Some(stored));
}

#[tokio::test]
async fn test_expired_credential_is_rotated_and_persisted() {
    let t2 = Utc::now().timestamp() + 6 * 3600;
    let store = Arc::new(MemoryCredentialStore::new(Some(credential(
        "A1",
        "R1",
        Utc::now().timestamp() - 60,
    ))));
    let exchange = Arc::new(FakeExchange::new().succeed("A2", "R2", t2));

    let result = manager(&exchange, &store)
        .get_valid_credential("seed")
        .await
        .unwrap();

    assert_eq!(result, credential("A2", "R2", t2));
    assert_eq!(store.snapshot(), Some(credential("A2", "R2", t2)));
    assert_eq!(exchange.calls(), vec!["R1".to_string()]);
}

#[tokio::test]
async fn test_refresh_failure_leaves_persisted_credential_untouched() {
    let stale = credential("A1", "R1", Utc::now().timestamp() - 60);
    let store = Arc::new(MemoryCredentialStore::new(Some(stale.clone())));
    let exchange = Arc::new(FakeExchange::new().reject(400, r#"{"message":"invalid_grant"}"#));

    let err = manager(&exchange, &store)
        .get_valid_credential("seed")
        .await
        .unwrap_err();

    match err {
        CredentialRefreshError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.snapshot(), Some(stale));
}

#[tokio::test]
async fn test_missing_state_refreshes_with_seed() {
    let store = Arc::new(MemoryCredentialStore::default());
    let exchange = Arc::new(FakeExchange::new().succeed("A1", "R1", Utc::now().timestamp() + 3600));

    manager(&exchange, &store)
        .get_valid_credential("seed-token")
        .await
        .unwrap();

    assert_eq!(exchange.calls(), vec!["seed-token".to_string()]);
    assert_eq!(store.snapshot().unwrap().refresh_token, "R1");
}

#[tokio::test]
async fn test_expiry_boundary_forces_refresh() {
    let store = Arc::new(MemoryCredentialStore::new(Some(credential("A1", "R1", 1_000))));
    let exchange = Arc::new(FakeExchange::new().succeed("A2", "R2", 5_000));
    let manager = manager(&exchange, &store);

    let reused = manager.get_valid_credential_at("seed", 999).await.unwrap();
    assert_eq!(reused.access_token, "A1");
    assert!(exchange.calls().is_empty());

    let refreshed = manager.get_valid_credential_at("seed", 1_000).await.unwrap();
    assert_eq!(refreshed.access_token, "A2");
    assert_eq!(exchange.calls(), vec!["R1".to_string()]);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_used_next_time() {
    let store = Arc::new(MemoryCredentialStore::default());
    let exchange = Arc::new(
        FakeExchange::new()
            .succeed("A1", "R1", 2_000)
            .succeed("A2", "R2", 4_000),
    );
    let manager = manager(&exchange, &store);

    manager.get_valid_credential_at("R0", 1_000).await.unwrap();
    manager.get_valid_credential_at("R0", 1_500).await.unwrap();
    let latest = manager.get_valid_credential_at("R0", 2_500).await.unwrap();

    assert_eq!(latest, credential("A2", "R2", 4_000));
    assert_eq!(exchange.calls(), vec!["R0".to_string(), "R1".to_string()]);
}

#[tokio::test]
async fn test_rotation_survives_a_new_manager() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strava_tokens.json");
    let exchange = Arc::new(FakeExchange::new().succeed("A1", "R1", 2_000));

    let first = CredentialManager::new(exchange.clone(), Arc::new(FileCredentialStore::new(&path)));
    first.get_valid_credential_at("R0", 1_000).await.unwrap();

    // Next scheduled run: fresh process, same file.
    let second = CredentialManager::new(exchange.clone(), Arc::new(FileCredentialStore::new(&path)));
    let reused = second.get_valid_credential_at("R0", 1_100).await.unwrap();

    assert_eq!(reused, credential("A1", "R1", 2_000));
    assert_eq!(exchange.calls(), vec!["R0".to_string()]);
}

#[tokio::test]
async fn test_persist_failure_is_reported() {
    let store = Arc::new(ReadOnlyCredentialStore { credential: None });
    let exchange = Arc::new(FakeExchange::new().succeed("A1", "R1", 2_000));
    let manager = CredentialManager::new(exchange.clone(), store);

    let err = manager.get_valid_credential_at("R0", 1_000).await.unwrap_err();
    assert!(matches!(err, CredentialRefreshError::Persist(_)));

    // The rotated token is kept in memory; the retried save fails again
    // rather than refreshing with the dead seed.
    let err = manager.get_valid_credential_at("R0", 1_100).await.unwrap_err();
    assert!(matches!(err, CredentialRefreshError::Persist(_)));
    assert_eq!(exchange.calls(), vec!["R0".to_string()]);
}

#[tokio::test]
async fn test_unreadable_state_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strava_tokens.json");
    std::fs::write(&path, "garbage").unwrap();

    let store = Arc::new(FileCredentialStore::new(&path));
    let exchange = Arc::new(FakeExchange::new());
    let manager = CredentialManager::new(exchange.clone(), store.clone());

    let err = manager.get_valid_credential("seed").await.unwrap_err();
    assert!(matches!(
        err,
        CredentialRefreshError::Load(CredentialStoreError::Malformed(_))
    ));
    assert!(exchange.calls().is_empty());
    assert!(store.load().await.is_err(), "file left as is");
}
