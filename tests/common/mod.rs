// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deterministic fakes for every collaborator, plus a fake Strava server.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use segment_tracker::config::Config;
use segment_tracker::error::{
    CredentialRefreshError, CredentialStoreError, FetchFailure, StoreError,
};
use segment_tracker::models::{Credential, Observation, SegmentStats};
use segment_tracker::routes::create_router;
use segment_tracker::services::strava::TokenRefreshResponse;
use segment_tracker::services::{CredentialStore, Poller, StatsSource, TokenExchange};
use segment_tracker::store::ObservationStore;
use segment_tracker::time_utils::parse_observed_at;
use segment_tracker::AppState;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A fixed instant: 2025-07-01 10:00:00 UTC (12:00 in Berlin).
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap()
}

pub fn credential(access: &str, refresh: &str, expires_at: i64) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
    }
}

pub fn stats(id: u64, name: &str, efforts: u64, athletes: u64) -> SegmentStats {
    SegmentStats {
        id,
        name: name.to_string(),
        effort_count: efforts,
        athlete_count: athletes,
    }
}

pub fn observation(
    id: u64,
    name: &str,
    observed_at: &str,
    efforts: u64,
    athletes: u64,
) -> Observation {
    Observation::new(
        stats(id, name, efforts, athletes),
        parse_observed_at(observed_at).unwrap(),
    )
}

/// Router over `store`; the run trigger is enabled when both are given.
pub fn create_test_app(
    store: Arc<dyn ObservationStore>,
    poller: Option<Poller>,
    trigger_token: Option<&str>,
) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.poll_trigger_token = trigger_token.map(str::to_string);

    let state = Arc::new(AppState {
        config,
        store,
        poller,
    });
    (create_router(state.clone()), state)
}

// ─── Token Exchange ─────────────────────────────────────────────────────────

/// Scripted token endpoint that records the refresh tokens it receives.
#[derive(Default)]
pub struct FakeExchange {
    responses: Mutex<VecDeque<Result<TokenRefreshResponse, CredentialRefreshError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(self, access: &str, refresh: &str, expires_at: i64) -> Self {
        self.responses.lock().unwrap().push_back(Ok(TokenRefreshResponse {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
        }));
        self
    }

    pub fn reject(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(CredentialRefreshError::Rejected {
                status,
                body: body.to_string(),
            }));
        self
    }

    /// Refresh tokens submitted so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenExchange for FakeExchange {
    async fn refresh_token_exchange(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, CredentialRefreshError> {
        self.calls.lock().unwrap().push(refresh_token.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected refresh with token {}", refresh_token))
    }
}

// ─── Credential Store ───────────────────────────────────────────────────────

/// Loads a fixed credential but refuses to save.
pub struct ReadOnlyCredentialStore {
    pub credential: Option<Credential>,
}

#[async_trait]
impl CredentialStore for ReadOnlyCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.credential.clone())
    }

    async fn save(&self, _credential: &Credential) -> Result<(), CredentialStoreError> {
        Err(CredentialStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only filesystem",
        )))
    }
}

// ─── Stats Source ───────────────────────────────────────────────────────────

pub enum FakeStat {
    Ok(SegmentStats),
    Status(u16),
    Unparsable,
}

/// Scripted statistics API; the same answer is given on every run.
#[derive(Default)]
pub struct FakeStats {
    answers: HashMap<u64, FakeStat>,
    calls: Mutex<Vec<(u64, String)>>,
}

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: u64, answer: FakeStat) -> Self {
        self.answers.insert(id, answer);
        self
    }

    /// `(entity_id, access_token)` per fetch, in order.
    pub fn calls(&self) -> Vec<(u64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatsSource for FakeStats {
    async fn fetch_entity_stats(
        &self,
        entity_id: u64,
        access_token: &str,
    ) -> Result<SegmentStats, FetchFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((entity_id, access_token.to_string()));

        match self.answers.get(&entity_id) {
            Some(FakeStat::Ok(stats)) => Ok(stats.clone()),
            Some(FakeStat::Status(status)) => Err(FetchFailure::Status {
                status: *status,
                body: "{\"message\":\"Record Not Found\"}".to_string(),
            }),
            Some(FakeStat::Unparsable) => {
                Err(FetchFailure::Parse("expected value at line 1".to_string()))
            }
            None => Err(FetchFailure::Status {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

// ─── Observation Store ──────────────────────────────────────────────────────

/// Accepts `fail_on - 1` appends, then fails every append and load.
pub struct BrokenStore {
    fail_on: usize,
    rows: Mutex<Vec<Observation>>,
}

impl BrokenStore {
    pub fn failing_on_append(fail_on: usize) -> Self {
        Self {
            fail_on,
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(&self) -> Vec<Observation> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObservationStore for BrokenStore {
    async fn append_row(&self, observation: &Observation) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.len() + 1 >= self.fail_on {
            return Err(StoreError::Http {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        rows.push(observation.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Observation>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }
}

// ─── Fake Strava Server ─────────────────────────────────────────────────────

/// In-process stand-in for the Strava API and token endpoint.
#[derive(Clone, Default)]
pub struct FakeStrava {
    /// segment id → (status, body)
    pub segments: Arc<Mutex<HashMap<u64, (u16, String)>>>,
    /// (status, body) returned by the token endpoint
    pub token_response: Arc<Mutex<(u16, String)>>,
    /// Form bodies received by the token endpoint
    pub token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    /// Authorization headers received by the segment endpoint
    pub auth_headers: Arc<Mutex<Vec<String>>>,
}

impl FakeStrava {
    pub fn segment(&self, id: u64, status: u16, body: &str) {
        self.segments
            .lock()
            .unwrap()
            .insert(id, (status, body.to_string()));
    }

    pub fn token(&self, status: u16, body: &str) {
        *self.token_response.lock().unwrap() = (status, body.to_string());
    }
}

async fn fake_segment(
    State(fake): State<FakeStrava>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        fake.auth_headers
            .lock()
            .unwrap()
            .push(auth.to_str().unwrap_or_default().to_string());
    }
    let (status, body) = fake
        .segments
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .unwrap_or((404, r#"{"message":"Record Not Found"}"#.to_string()));
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn fake_token(
    State(fake): State<FakeStrava>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    fake.token_requests.lock().unwrap().push(form);
    let (status, body) = fake.token_response.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), body)
}

/// Serve `fake` on an ephemeral port; returns `(api_url, token_url)`.
pub async fn spawn_fake_strava(fake: FakeStrava) -> (String, String) {
    let app = Router::new()
        .route("/api/v3/segments/{id}", get(fake_segment))
        .route("/oauth/token", post(fake_token))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (
        format!("http://{}/api/v3", addr),
        format!("http://{}/oauth/token", addr),
    )
}
