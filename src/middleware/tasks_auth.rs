// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run-trigger authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <POLL_TRIGGER_TOKEN>` for `/tasks/*` routes.
///
/// Responds 404 when the trigger is not configured, so a read-only
/// deployment does not advertise it.
pub async fn require_trigger_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = match (&state.config.poll_trigger_token, &state.poller) {
        (Some(token), Some(_)) => token,
        _ => return Err(AppError::NotFound("Run trigger disabled".to_string())),
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            tracing::warn!("Blocked trigger request without bearer token");
            AppError::Unauthorized
        })?;

    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("Blocked trigger request with invalid token");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
