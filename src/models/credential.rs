// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Delegated Strava credential.

use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth credential persisted between runs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Short-lived bearer token for API calls
    pub access_token: String,
    /// Rotates on every refresh; the previous value stops working
    pub refresh_token: String,
    /// Expiry of `access_token` (seconds since epoch)
    pub expires_at: i64,
}

impl Credential {
    /// Initial state when nothing has been persisted: already expired, so
    /// the first use forces a refresh with the seed token.
    pub fn seed(refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: String::new(),
            refresh_token: refresh_token.into(),
            expires_at: 0,
        }
    }

    /// Valid iff expiry is strictly in the future.
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
