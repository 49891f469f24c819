// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod pipeline;
pub mod poller;
pub mod strava;

pub use credentials::{
    CredentialManager, CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenExchange,
};
pub use pipeline::{ObservationPipeline, RunReport, RunSummary, StatsSource};
pub use poller::Poller;
pub use strava::StravaClient;
