// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled polling job.
//!
//! Runs one pass over the segment registry and exits. The exit status tells
//! the scheduler whether the run as a whole succeeded: per-segment fetch
//! failures are reported in the summary but do not fail the run, while a
//! credential or store failure does.

use segment_tracker::{
    config::Config, logging::init_logging, services::Poller, store::open_store,
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    let store = open_store(&config.store);
    let poller = match Poller::from_config(&config, store) {
        Ok(poller) => poller,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    match poller.poll_once().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}
