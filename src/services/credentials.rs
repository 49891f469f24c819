// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential lifecycle: reuse the persisted Strava credential until it
//! expires, otherwise exchange the refresh token once and persist the
//! rotated result before handing it out.
//!
//! Runs are assumed not to overlap across processes. Two processes
//! refreshing with the same refresh token race, and the loser's token is
//! invalidated by Strava. Within one process the manager serializes access.

use crate::error::{CredentialRefreshError, CredentialStoreError};
use crate::models::Credential;
use crate::services::strava::TokenRefreshResponse;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Remote refresh-token exchange.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn refresh_token_exchange(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, CredentialRefreshError>;
}

/// Durable location of the credential between runs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;

    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError>;
}

// ─── File Store ─────────────────────────────────────────────────────────────

/// JSON file holding `{access_token, refresh_token, expires_at}`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write to a sibling temp file, fsync, then rename over the target, so
    /// a crash never leaves a truncated file behind.
    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec_pretty(credential)?;
        let temp = self.temp_path();

        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&payload).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

// ─── Memory Store ───────────────────────────────────────────────────────────

/// In-memory credential store for tests and offline development.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: std::sync::Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new(initial: Option<Credential>) -> Self {
        Self {
            credential: std::sync::Mutex::new(initial),
        }
    }

    /// Currently persisted credential.
    pub fn snapshot(&self) -> Option<Credential> {
        self.credential
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *self.credential.lock().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        Ok(())
    }
}

// ─── Credential Manager ─────────────────────────────────────────────────────

#[derive(Default)]
struct ManagerState {
    credential: Option<Credential>,
    /// A refresh succeeded but persisting it failed; retried on next use.
    unsaved: bool,
}

/// Hands out valid credentials, refreshing only when necessary.
pub struct CredentialManager {
    exchange: Arc<dyn TokenExchange>,
    store: Arc<dyn CredentialStore>,
    state: Mutex<ManagerState>,
}

impl CredentialManager {
    pub fn new(exchange: Arc<dyn TokenExchange>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            exchange,
            store,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Return a credential valid at the moment of return.
    ///
    /// `refresh_token_seed` is only used when no credential was ever
    /// persisted; afterwards the rotated token from the store wins.
    pub async fn get_valid_credential(
        &self,
        refresh_token_seed: &str,
    ) -> Result<Credential, CredentialRefreshError> {
        self.get_valid_credential_at(refresh_token_seed, Utc::now().timestamp())
            .await
    }

    /// Same as [`get_valid_credential`](Self::get_valid_credential) with an
    /// explicit clock (seconds since epoch).
    pub async fn get_valid_credential_at(
        &self,
        refresh_token_seed: &str,
        now: i64,
    ) -> Result<Credential, CredentialRefreshError> {
        let mut state = self.state.lock().await;

        if state.unsaved {
            if let Some(credential) = state.credential.as_ref() {
                self.store
                    .save(credential)
                    .await
                    .map_err(CredentialRefreshError::Persist)?;
            }
            state.unsaved = false;
            tracing::info!("Previously unsaved credential persisted");
        }

        if state.credential.is_none() {
            state.credential = self
                .store
                .load()
                .await
                .map_err(CredentialRefreshError::Load)?;
            if state.credential.is_none() {
                tracing::info!("No persisted credential, using refresh token seed");
            }
        }

        let current = state
            .credential
            .clone()
            .unwrap_or_else(|| Credential::seed(refresh_token_seed));

        if current.is_valid_at(now) {
            tracing::debug!(expires_at = current.expires_at, "Reusing persisted credential");
            return Ok(current);
        }

        tracing::info!(
            expires_at = current.expires_at,
            "Access token expired, refreshing"
        );

        let response = self
            .exchange
            .refresh_token_exchange(&current.refresh_token)
            .await?;

        let refreshed = Credential {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_at,
        };

        // The old refresh token is dead from here on; keep the new one even
        // if persisting fails so it is not lost for the rest of the process.
        state.credential = Some(refreshed.clone());
        if let Err(e) = self.store.save(&refreshed).await {
            state.unsaved = true;
            tracing::error!(error = %e, "Failed to persist refreshed credential");
            return Err(CredentialRefreshError::Persist(e));
        }

        if !refreshed.is_valid_at(now) {
            return Err(CredentialRefreshError::InvalidResponse(format!(
                "refreshed token already expired (expires_at {})",
                refreshed.expires_at
            )));
        }

        tracing::info!(
            expires_at = refreshed.expires_at,
            "Token refreshed and persisted"
        );
        Ok(refreshed)
    }
}
