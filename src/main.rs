// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Segment-Tracker dashboard server
//!
//! Serves the time-series dashboard over the observation table and, when a
//! trigger token is configured, an authenticated endpoint that runs one
//! polling pass.

use anyhow::Context;
use segment_tracker::{
    config::Config, logging::init_logging, services::Poller, store::open_store, AppState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(port = config.port, "Starting Segment-Tracker dashboard");

    let store = open_store(&config.store);

    let poller = match (&config.poll_trigger_token, &config.strava) {
        (Some(_), Some(_)) => {
            tracing::info!(
                segments = config.segment_ids.len(),
                "Run trigger enabled at /tasks/poll"
            );
            Some(
                Poller::from_config(&config, store.clone())
                    .context("invalid run trigger configuration")?,
            )
        }
        (Some(_), None) => {
            tracing::warn!("POLL_TRIGGER_TOKEN set without Strava credentials, trigger disabled");
            None
        }
        _ => None,
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        poller,
    });

    let app = segment_tracker::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
