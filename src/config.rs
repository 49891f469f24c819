// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Configuration is resolved once at process start and passed explicitly
//! into the credential manager, the pipeline and the dashboard. Nothing in
//! the business logic reads the environment.

use crate::store::sheets::ServiceAccountKey;
use chrono_tz::Tz;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Segments polled when `SEGMENT_IDS` is not set (Nürnberg and Schnaittach trails).
pub const DEFAULT_SEGMENT_IDS: &[u64] = &[
    10515763, // South Park Line
    19267099, // SouthPark (ebike)
    18513962, // Bikespielwiese (Pirate)
    21015289, // Pirat (ebike)
    8133978,  // Bucktrail
    21015374, // Hard Enduro Zweite Hälfte (ebike Bucktrail)
    5566759,  // Sketchy Downhill (Kangaroo)
    10515526, // Dreierline
    21125079, // Prickelpit (alt)
    36673576, // Prickel-Pit-Trail (ebike)
    29428315, // Yoli Line eBike
    29428229, // Jägertrail eBike (Räubertrail)
    10828939, // Wurzeltrail ("Teufelstisch")
    10516019, // Snake-Line (Soul Kitchen)
    23180608, // E-Schlange 2020
    8442428,  // Rothenberg_Höllenritt
    23690264, // e_hoellenritt_95percent
    10874261, // frängmän_enduro
    36790585, // E-Frängmän New line
    9097172,  // Enzenstein_Höllenritt
    23689715, // e_enzenstein_80percent
    11082443, // die_birke_enduro
    35376142, // E-Birke new
];

pub const DEFAULT_STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Strava OAuth client identity plus the refresh token seed.
#[derive(Clone)]
pub struct StravaCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Used only when no persisted credential exists yet.
    pub refresh_token: String,
}

impl fmt::Debug for StravaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StravaCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Where observations are appended and loaded from.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Google Sheets worksheet, authenticated with a service account.
    Sheets {
        sheet_id: String,
        worksheet: String,
        service_account: ServiceAccountKey,
    },
    /// Local append-only file, one JSON row per line.
    File { path: PathBuf },
}

/// Dashboard language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    De,
    En,
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Lang::De),
            "en" => Ok(Lang::En),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava client credentials (absent for a read-only dashboard)
    pub strava: Option<StravaCredentials>,
    /// Segments to poll, in polling order
    pub segment_ids: Vec<u64>,
    /// Persisted credential location
    pub token_file: PathBuf,
    pub strava_api_url: String,
    pub strava_token_url: String,
    pub store: StoreConfig,
    /// Reference timezone for `observed_at`
    pub timezone: Tz,
    /// Dashboard server port
    pub port: u16,
    pub dashboard_lang: Lang,
    /// Bearer token guarding `POST /tasks/poll`; the route is off when unset
    pub poll_trigger_token: Option<String>,
}

impl Config {
    /// Config for tests: local file store, no Strava credentials.
    pub fn test_default() -> Self {
        Self {
            strava: None,
            segment_ids: vec![1, 2, 3],
            token_file: PathBuf::from("strava_tokens.json"),
            strava_api_url: DEFAULT_STRAVA_API_URL.to_string(),
            strava_token_url: DEFAULT_STRAVA_TOKEN_URL.to_string(),
            store: StoreConfig::File {
                path: PathBuf::from("data/observations.jsonl"),
            },
            timezone: chrono_tz::Europe::Berlin,
            port: 8080,
            dashboard_lang: Lang::De,
            poll_trigger_token: None,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let strava = match (
            var("STRAVA_CLIENT_ID"),
            var("STRAVA_CLIENT_SECRET"),
            var("STRAVA_REFRESH_TOKEN"),
        ) {
            (None, None, None) => None,
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Some(StravaCredentials {
                    client_id,
                    client_secret,
                    refresh_token,
                })
            }
            (None, _, _) => return Err(ConfigError::Missing("STRAVA_CLIENT_ID")),
            (_, None, _) => return Err(ConfigError::Missing("STRAVA_CLIENT_SECRET")),
            (_, _, None) => return Err(ConfigError::Missing("STRAVA_REFRESH_TOKEN")),
        };

        let segment_ids = match var("SEGMENT_IDS") {
            Some(raw) => parse_segment_ids(&raw)?,
            None => DEFAULT_SEGMENT_IDS.to_vec(),
        };

        let store = match var("GOOGLE_SHEET_ID") {
            Some(sheet_id) => {
                let raw_key = var("GOOGLE_SERVICE_ACCOUNT")
                    .ok_or(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT"))?;
                let service_account =
                    serde_json::from_str(&raw_key).map_err(|e| ConfigError::Invalid {
                        var: "GOOGLE_SERVICE_ACCOUNT",
                        reason: e.to_string(),
                    })?;
                StoreConfig::Sheets {
                    sheet_id,
                    worksheet: var("GOOGLE_WORKSHEET").unwrap_or_else(|| "Sheet1".to_string()),
                    service_account,
                }
            }
            None => StoreConfig::File {
                path: var("OBSERVATIONS_FILE")
                    .unwrap_or_else(|| "data/observations.jsonl".to_string())
                    .into(),
            },
        };

        let timezone = match var("OBSERVATION_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                var: "OBSERVATION_TIMEZONE",
                reason: e.to_string(),
            })?,
            None => chrono_tz::Europe::Berlin,
        };

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                reason: format!("'{}' is not a port number", raw),
            })?,
            None => 8080,
        };

        let dashboard_lang = match var("DASHBOARD_LANG") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "DASHBOARD_LANG",
                reason,
            })?,
            None => Lang::De,
        };

        Ok(Self {
            strava,
            segment_ids,
            token_file: var("STRAVA_TOKEN_FILE")
                .unwrap_or_else(|| "strava_tokens.json".to_string())
                .into(),
            strava_api_url: var("STRAVA_API_URL")
                .unwrap_or_else(|| DEFAULT_STRAVA_API_URL.to_string()),
            strava_token_url: var("STRAVA_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_STRAVA_TOKEN_URL.to_string()),
            store,
            timezone,
            port,
            dashboard_lang,
            poll_trigger_token: var("POLL_TRIGGER_TOKEN"),
        })
    }

    /// Strava credentials, required by anything that polls.
    pub fn require_strava(&self) -> Result<&StravaCredentials, ConfigError> {
        self.strava
            .as_ref()
            .ok_or(ConfigError::Missing("STRAVA_CLIENT_ID"))
    }
}

/// Parse a comma-separated segment id list, preserving order.
fn parse_segment_ids(raw: &str) -> Result<Vec<u64>, ConfigError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "SEGMENT_IDS",
                reason: format!("'{}' is not a segment id", s),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
        return Err(ConfigError::Invalid {
            var: "SEGMENT_IDS",
            reason: "no segment ids given".to_string(),
        });
    }
    Ok(ids)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
