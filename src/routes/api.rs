// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only JSON API over the observation table.

use crate::error::{AppError, Result};
use crate::models::{group_by_segment, SegmentSeries, SegmentSummary};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// API routes (public, read-only).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/segments", get(get_segments))
        .route("/api/segments/{id}/series", get(get_segment_series))
}

// ─── Segments ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SegmentsResponse {
    pub segments: Vec<SegmentSummary>,
    /// Total rows in the table
    pub observations: usize,
}

/// List every segment that has at least one observation.
async fn get_segments(State(state): State<Arc<AppState>>) -> Result<Json<SegmentsResponse>> {
    let observations = state.store.load_all().await?;
    let segments = group_by_segment(&observations)
        .iter()
        .filter_map(SegmentSeries::summary)
        .collect();

    Ok(Json(SegmentsResponse {
        segments,
        observations: observations.len(),
    }))
}

// ─── Series ──────────────────────────────────────────────────

/// Full history of one segment, in store order.
async fn get_segment_series(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<u64>,
) -> Result<Json<SegmentSeries>> {
    let observations = state.store.load_all().await?;

    group_by_segment(&observations)
        .into_iter()
        .find(|series| series.entity_id == entity_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Segment {} has no observations", entity_id)))
}
