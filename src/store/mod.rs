// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observation store (append-only table).
//!
//! Backends:
//! - Google Sheets worksheet (production)
//! - Local JSON-lines file (development, single host)
//! - Memory (tests)
//!
//! Every backend keeps the fixed column order of [`COLUMNS`](crate::models::COLUMNS).
//! The pipeline only ever appends; reading is for the dashboard.

pub mod file;
pub mod memory;
pub mod sheets;

pub use file::FileObservationStore;
pub use memory::MemoryObservationStore;
pub use sheets::SheetsStore;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::observation::is_header_row;
use crate::models::Observation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Append-only observation table.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Append exactly one row. Existing rows are never touched.
    async fn append_row(&self, observation: &Observation) -> Result<(), StoreError>;

    /// Read the full table in store order.
    async fn load_all(&self) -> Result<Vec<Observation>, StoreError>;
}

/// Open the backend selected by configuration.
pub fn open_store(config: &StoreConfig) -> Arc<dyn ObservationStore> {
    match config {
        StoreConfig::Sheets {
            sheet_id,
            worksheet,
            service_account,
        } => {
            tracing::info!(sheet_id = %sheet_id, worksheet = %worksheet, "Using Google Sheets store");
            Arc::new(SheetsStore::new(
                sheet_id.clone(),
                worksheet.clone(),
                service_account.clone(),
            ))
        }
        StoreConfig::File { path } => {
            tracing::info!(path = %path.display(), "Using local file store");
            Arc::new(FileObservationStore::new(path))
        }
    }
}

/// Convert raw rows to observations, skipping header and malformed rows.
pub(crate) fn rows_to_observations(rows: &[Vec<Value>]) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if index == 0 && is_header_row(row) {
            continue;
        }
        match Observation::from_row(row) {
            Ok(obs) => observations.push(obs),
            Err(e) => {
                tracing::warn!(row = index + 1, error = %e, "Skipping malformed row");
            }
        }
    }

    observations
}
