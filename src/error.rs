// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the credential lifecycle, the observation pipeline and
//! the dashboard's HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure to obtain a valid Strava credential. Fatal for the current run.
#[derive(Debug, thiserror::Error)]
pub enum CredentialRefreshError {
    /// The token endpoint answered with a non-success status.
    #[error("Token refresh rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token refresh request failed: {0}")]
    Transport(String),

    /// The endpoint answered 2xx but the body was not a token response.
    #[error("Token refresh response unparsable: {0}")]
    InvalidResponse(String),

    /// The exchange succeeded but the rotated credential could not be saved.
    #[error("Failed to persist refreshed credential: {0}")]
    Persist(#[source] CredentialStoreError),

    #[error("Failed to load persisted credential: {0}")]
    Load(#[source] CredentialStoreError),
}

/// Errors from a credential persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credential state: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Why fetching one segment failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unparsable response: {0}")]
    Parse(String),
}

/// A per-entity fetch failure. Recorded and skipped, never aborts a batch.
#[derive(Debug, thiserror::Error)]
#[error("Segment {entity_id}: {cause}")]
pub struct FetchError {
    pub entity_id: u64,
    #[source]
    pub cause: FetchFailure,
}

/// Errors from an observation store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Store request failed: {0}")]
    Transport(String),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store authentication failed: {0}")]
    Auth(String),

    #[error("Malformed store data: {0}")]
    Malformed(String),
}

/// Run-level failure: aborts the run and yields a non-zero exit status.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Credential(#[from] CredentialRefreshError),

    #[error("Append failed for segment {entity_id}: {source}")]
    StoreAppend {
        entity_id: u64,
        #[source]
        source: StoreError,
    },
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid trigger token")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Credential(e) => AppError::StravaApi(e.to_string()),
            RunError::StoreAppend { source, .. } => AppError::Store(source),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::StravaApi(msg) => {
                tracing::error!(error = %msg, "Strava error");
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
