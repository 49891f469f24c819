// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for segment statistics and token refresh.
//!
//! Handles:
//! - Segment fetching (`GET /segments/{id}`)
//! - Refresh-token exchange (`POST /oauth/token`)
//! - Rate limit detection (logged; the entity is skipped for this run)

use crate::config::{Config, ConfigError, DEFAULT_STRAVA_API_URL, DEFAULT_STRAVA_TOKEN_URL};
use crate::error::{CredentialRefreshError, FetchFailure};
use crate::models::SegmentStats;
use crate::services::credentials::TokenExchange;
use crate::services::pipeline::StatsSource;
use async_trait::async_trait;
use serde::Deserialize;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_STRAVA_API_URL.to_string(),
            token_url: DEFAULT_STRAVA_TOKEN_URL.to_string(),
            client_id,
            client_secret,
        }
    }

    /// Point the client at different API and token endpoints.
    pub fn with_urls(mut self, base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    /// Build a client from resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let strava = config.require_strava()?;
        Ok(
            Self::new(strava.client_id.clone(), strava.client_secret.clone())
                .with_urls(&config.strava_api_url, &config.strava_token_url),
        )
    }

    /// Get a segment with its popularity counts.
    pub async fn get_segment(
        &self,
        access_token: &str,
        segment_id: u64,
    ) -> Result<StravaSegment, FetchFailure> {
        let url = format!("{}/segments/{}", self.base_url, segment_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                tracing::warn!(segment_id, "Strava rate limit hit (429)");
            }
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchFailure::Parse(e.to_string()))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Strava rotates the refresh token; the returned one replaces the old.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, CredentialRefreshError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| CredentialRefreshError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Strava token refresh rejected");
            return Err(CredentialRefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CredentialRefreshError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TokenExchange for StravaClient {
    async fn refresh_token_exchange(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, CredentialRefreshError> {
        self.refresh_token(refresh_token).await
    }
}

#[async_trait]
impl StatsSource for StravaClient {
    async fn fetch_entity_stats(
        &self,
        entity_id: u64,
        access_token: &str,
    ) -> Result<SegmentStats, FetchFailure> {
        self.get_segment(access_token, entity_id).await?.into_stats()
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Detailed segment response (only the fields we track).
#[derive(Debug, Clone, Deserialize)]
pub struct StravaSegment {
    pub id: u64,
    pub name: String,
    pub effort_count: Option<u64>,
    pub athlete_count: Option<u64>,
    #[serde(default, alias = "statistics")]
    pub athlete_segment_stats: Option<SegmentCounts>,
}

/// Nested statistics object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentCounts {
    pub effort_count: Option<u64>,
    pub athlete_count: Option<u64>,
}

impl StravaSegment {
    /// Resolve the counts, preferring the nested statistics object.
    pub fn into_stats(self) -> Result<SegmentStats, FetchFailure> {
        let nested = self.athlete_segment_stats.unwrap_or_default();

        let effort_count = nested
            .effort_count
            .or(self.effort_count)
            .ok_or_else(|| FetchFailure::Parse("missing field `effort_count`".to_string()))?;
        let athlete_count = nested
            .athlete_count
            .or(self.athlete_count)
            .ok_or_else(|| FetchFailure::Parse("missing field `athlete_count`".to_string()))?;

        Ok(SegmentStats {
            id: self.id,
            name: self.name,
            effort_count,
            athlete_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<SegmentStats, FetchFailure> {
        serde_json::from_str::<StravaSegment>(json)
            .map_err(|e| FetchFailure::Parse(e.to_string()))?
            .into_stats()
    }

    #[test]
    fn test_top_level_counts() {
        let stats = parse(r#"{"id":99,"name":"X","effort_count":5,"athlete_count":2}"#).unwrap();
        assert_eq!(
            stats,
            SegmentStats {
                id: 99,
                name: "X".to_string(),
                effort_count: 5,
                athlete_count: 2
            }
        );
    }

    #[test]
    fn test_nested_counts_win() {
        let stats = parse(
            r#"{"id":7,"name":"Bucktrail","effort_count":1,"athlete_count":1,
                "athlete_segment_stats":{"effort_count":120,"athlete_count":45}}"#,
        )
        .unwrap();
        assert_eq!(stats.effort_count, 120);
        assert_eq!(stats.athlete_count, 45);
    }

    #[test]
    fn test_partial_nested_falls_back() {
        let stats = parse(
            r#"{"id":7,"name":"Bucktrail","athlete_count":9,
                "statistics":{"effort_count":30}}"#,
        )
        .unwrap();
        assert_eq!(stats.effort_count, 30);
        assert_eq!(stats.athlete_count, 9);
    }

    #[test]
    fn test_missing_counts_is_parse_failure() {
        assert!(matches!(
            parse(r#"{"id":7,"name":"Bucktrail"}"#),
            Err(FetchFailure::Parse(_))
        ));
        assert!(matches!(
            parse(r#"{"id":7,"name":"Bucktrail","effort_count":-1,"athlete_count":2}"#),
            Err(FetchFailure::Parse(_))
        ));
    }
}
