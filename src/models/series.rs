// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-segment time series for the dashboard.
//!
//! The dashboard reads the whole table and groups it here; nothing is
//! pre-aggregated in the store.

use crate::models::Observation;
use crate::time_utils::format_observed_at;
use serde::Serialize;

/// One point of a segment's history.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeriesPoint {
    pub observed_at: String,
    pub effort_count: u64,
    pub athlete_count: u64,
}

/// All samples of one segment, in store order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SegmentSeries {
    pub entity_id: u64,
    /// Name from the most recent sample (Strava names can change)
    pub entity_name: String,
    pub points: Vec<SeriesPoint>,
}

/// Compact overview row for the segment list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SegmentSummary {
    pub entity_id: u64,
    pub entity_name: String,
    pub samples: usize,
    pub first_observed_at: String,
    pub last_observed_at: String,
    pub latest_effort_count: u64,
    pub latest_athlete_count: u64,
}

impl SegmentSeries {
    pub fn summary(&self) -> Option<SegmentSummary> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(SegmentSummary {
            entity_id: self.entity_id,
            entity_name: self.entity_name.clone(),
            samples: self.points.len(),
            first_observed_at: first.observed_at.clone(),
            last_observed_at: last.observed_at.clone(),
            latest_effort_count: last.effort_count,
            latest_athlete_count: last.athlete_count,
        })
    }
}

/// Group observations by segment.
///
/// Segments keep the order in which they first appear in the table; points
/// keep store order. The table is append-ordered, and `observed_at` has no
/// offset, so sorting on it would reorder the repeated hour after DST ends.
pub fn group_by_segment(observations: &[Observation]) -> Vec<SegmentSeries> {
    let mut order: Vec<u64> = Vec::new();
    let mut grouped: std::collections::HashMap<u64, Vec<&Observation>> =
        std::collections::HashMap::new();

    for obs in observations {
        grouped
            .entry(obs.entity_id)
            .or_insert_with(|| {
                order.push(obs.entity_id);
                Vec::new()
            })
            .push(obs);
    }

    order
        .into_iter()
        .filter_map(|entity_id| {
            let samples = grouped.remove(&entity_id)?;
            let entity_name = samples.last()?.entity_name.clone();
            Some(SegmentSeries {
                entity_id,
                entity_name,
                points: samples
                    .into_iter()
                    .map(|obs| SeriesPoint {
                        observed_at: format_observed_at(&obs.observed_at),
                        effort_count: obs.effort_count,
                        athlete_count: obs.athlete_count,
                    })
                    .collect(),
            })
        })
        .collect()
}
