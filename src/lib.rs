// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Segment-Tracker: popularity history for Strava segments
//!
//! This crate polls Strava for the effort and athlete counts of a fixed set
//! of segments, appends one observation per segment and run to an
//! append-only table, and serves a dashboard over the accumulated history.

pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::Poller;
use std::sync::Arc;
use store::ObservationStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObservationStore>,
    /// Present only when the run trigger is enabled.
    pub poller: Option<Poller>,
}
