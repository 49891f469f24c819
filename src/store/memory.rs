// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory observation store.

use super::ObservationStore;
use crate::error::StoreError;
use crate::models::Observation;
use async_trait::async_trait;
use std::sync::Mutex;

/// Vector-backed table for tests and offline development.
#[derive(Debug, Default)]
pub struct MemoryObservationStore {
    rows: Mutex<Vec<Observation>>,
}

impl MemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_rows(rows: Vec<Observation>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn rows(&self) -> Vec<Observation> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn append_row(&self, observation: &Observation) -> Result<(), StoreError> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observation.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Observation>, StoreError> {
        Ok(self.rows())
    }
}
