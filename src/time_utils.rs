// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Storage format of `observed_at`: wall-clock time in the reference zone.
pub const OBSERVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wall-clock time of `instant` in the reference timezone.
pub fn local_wall_time(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    tz.from_utc_datetime(&instant.naive_utc()).naive_local()
}

/// Format an observation timestamp for the store.
pub fn format_observed_at(at: &NaiveDateTime) -> String {
    at.format(OBSERVED_AT_FORMAT).to_string()
}

/// Parse a stored observation timestamp.
///
/// Accepts the storage format and, for rows written by other tools, RFC 3339
/// (the offset is dropped, keeping the wall-clock time).
pub fn parse_observed_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, OBSERVED_AT_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}
