// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One complete polling pass: credential, then every registered segment.
//!
//! Shared by the `poll` binary and the dashboard's run trigger.

use crate::config::{Config, ConfigError};
use crate::error::RunError;
use crate::services::credentials::{CredentialManager, FileCredentialStore};
use crate::services::pipeline::{ObservationPipeline, RunReport};
use crate::services::strava::StravaClient;
use crate::store::ObservationStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs the pipeline for the configured segment registry.
pub struct Poller {
    credentials: CredentialManager,
    pipeline: ObservationPipeline,
    segment_ids: Vec<u64>,
    refresh_token_seed: String,
    /// Overlapping runs would refresh with the same token.
    run_lock: Mutex<()>,
}

impl Poller {
    pub fn new(
        credentials: CredentialManager,
        pipeline: ObservationPipeline,
        segment_ids: Vec<u64>,
        refresh_token_seed: String,
    ) -> Self {
        Self {
            credentials,
            pipeline,
            segment_ids,
            refresh_token_seed,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire the Strava client, the credential file and `store` from config.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn ObservationStore>,
    ) -> Result<Self, ConfigError> {
        let strava = config.require_strava()?;
        let client = Arc::new(StravaClient::from_config(config)?);

        let credentials = CredentialManager::new(
            client.clone(),
            Arc::new(FileCredentialStore::new(&config.token_file)),
        );
        let pipeline = ObservationPipeline::new(client, store, config.timezone);

        Ok(Self::new(
            credentials,
            pipeline,
            config.segment_ids.clone(),
            strava.refresh_token.clone(),
        ))
    }

    /// Obtain a valid credential, then poll every segment once.
    pub async fn poll_once(&self) -> Result<RunReport, RunError> {
        let _guard = self.run_lock.lock().await;

        tracing::info!(segments = self.segment_ids.len(), "Starting run");

        let credential = self
            .credentials
            .get_valid_credential(&self.refresh_token_seed)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Could not obtain a valid credential, aborting run");
                RunError::Credential(e)
            })?;

        let report = self.pipeline.run(&self.segment_ids, &credential).await?;
        report.summary().log();
        Ok(report)
    }
}
