// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run trigger for external schedulers that can only make HTTP calls.
//!
//! Guarded by [`require_trigger_token`](crate::middleware::require_trigger_token),
//! which is applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::services::RunSummary;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

/// Task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/poll", post(poll))
}

/// Run one polling pass and report per-segment outcomes.
async fn poll(State(state): State<Arc<AppState>>) -> Result<Json<RunSummary>> {
    let poller = state
        .poller
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Run trigger disabled".to_string()))?;

    tracing::info!("Run triggered over HTTP");
    let report = poller.poll_once().await?;
    Ok(Json(report.summary()))
}
