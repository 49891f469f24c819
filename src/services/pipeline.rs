// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observation pipeline: one fetch and at most one appended row per segment.
//!
//! Segments are processed strictly in order, one at a time. A failed fetch
//! is recorded and skipped; a failed append aborts the rest of the run since
//! the store can no longer be trusted.

use crate::error::{FetchError, FetchFailure, RunError};
use crate::models::{Credential, Observation, SegmentStats};
use crate::store::ObservationStore;
use crate::time_utils::local_wall_time;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

/// Remote source of current segment statistics.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_entity_stats(
        &self,
        entity_id: u64,
        access_token: &str,
    ) -> Result<SegmentStats, FetchFailure>;
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Result for one segment of a run.
pub type EntityOutcome = Result<Observation, FetchError>;

/// Fetches statistics and appends observations.
pub struct ObservationPipeline {
    source: Arc<dyn StatsSource>,
    store: Arc<dyn ObservationStore>,
    timezone: Tz,
    clock: Clock,
}

impl ObservationPipeline {
    pub fn new(
        source: Arc<dyn StatsSource>,
        store: Arc<dyn ObservationStore>,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            store,
            timezone,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used for `observed_at`.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Poll every segment in `entity_ids` order.
    ///
    /// Returns one outcome per segment. Only an append failure is an `Err`;
    /// rows appended before it stay in the store.
    pub async fn run(
        &self,
        entity_ids: &[u64],
        credential: &Credential,
    ) -> Result<RunReport, RunError> {
        let mut outcomes = Vec::with_capacity(entity_ids.len());

        for &entity_id in entity_ids {
            let stats = match self
                .source
                .fetch_entity_stats(entity_id, &credential.access_token)
                .await
            {
                Ok(stats) => stats,
                Err(cause) => {
                    tracing::warn!(entity_id, error = %cause, "Segment fetch failed, skipping");
                    outcomes.push(Err(FetchError { entity_id, cause }));
                    continue;
                }
            };

            if stats.id != entity_id {
                tracing::warn!(
                    entity_id,
                    returned_id = stats.id,
                    "Strava returned a different segment id"
                );
            }

            let observed_at = local_wall_time((self.clock)(), self.timezone);
            let observation = Observation::new(stats, observed_at);

            self.store
                .append_row(&observation)
                .await
                .map_err(|source| {
                    tracing::error!(entity_id, error = %source, "Store append failed, aborting run");
                    RunError::StoreAppend { entity_id, source }
                })?;

            tracing::debug!(
                entity_id,
                effort_count = observation.effort_count,
                athlete_count = observation.athlete_count,
                "Observation appended"
            );
            outcomes.push(Ok(observation));
        }

        Ok(RunReport { outcomes })
    }
}

/// Per-segment outcomes of one run, in polling order.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<EntityOutcome>,
}

impl RunReport {
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            attempted: self.outcomes.len(),
            succeeded: self.observations().map(|o| o.entity_id).collect(),
            failed: self
                .failures()
                .map(|e| FailedEntity {
                    entity_id: e.entity_id,
                    error: e.cause.to_string(),
                })
                .collect(),
        }
    }
}

/// End-of-run report, logged by the poll binary and returned by the trigger.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: Vec<u64>,
    pub failed: Vec<FailedEntity>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedEntity {
    pub entity_id: u64,
    pub error: String,
}

impl RunSummary {
    pub fn log(&self) {
        let failed_ids: Vec<u64> = self.failed.iter().map(|f| f.entity_id).collect();
        tracing::info!(
            attempted = self.attempted,
            succeeded = self.succeeded.len(),
            failed = self.failed.len(),
            failed_ids = ?failed_ids,
            "Run complete"
        );
    }
}
