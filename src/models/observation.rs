// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observation model and its fixed row layout in the store.

use crate::time_utils::{format_observed_at, parse_observed_at};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store columns, in order.
pub const COLUMNS: [&str; 5] = [
    "entity_id",
    "entity_name",
    "observed_at",
    "effort_count",
    "athlete_count",
];

/// Current statistics for one segment, as reported by Strava.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentStats {
    pub id: u64,
    pub name: String,
    pub effort_count: u64,
    pub athlete_count: u64,
}

/// One timestamped sample of a segment's statistics. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: u64,
    pub entity_name: String,
    /// Wall-clock time in the reference timezone
    pub observed_at: NaiveDateTime,
    pub effort_count: u64,
    pub athlete_count: u64,
}

/// A stored row that cannot be read back as an observation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RowError {
    #[error("expected {expected} cells, found {found}")]
    Width { expected: usize, found: usize },

    #[error("column {column} is not a non-negative integer")]
    NotAnInteger { column: &'static str },

    #[error("column observed_at is not a timestamp: {0}")]
    BadTimestamp(String),
}

impl Observation {
    pub fn new(stats: SegmentStats, observed_at: NaiveDateTime) -> Self {
        Self {
            entity_id: stats.id,
            entity_name: stats.name,
            observed_at,
            effort_count: stats.effort_count,
            athlete_count: stats.athlete_count,
        }
    }

    /// Cells in `COLUMNS` order.
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.entity_id),
            Value::from(self.entity_name.clone()),
            Value::from(format_observed_at(&self.observed_at)),
            Value::from(self.effort_count),
            Value::from(self.athlete_count),
        ]
    }

    /// Rebuild an observation from stored cells.
    ///
    /// Spreadsheet backends may hand numbers back as strings, so integer
    /// columns accept both.
    pub fn from_row(cells: &[Value]) -> Result<Self, RowError> {
        if cells.len() < COLUMNS.len() {
            return Err(RowError::Width {
                expected: COLUMNS.len(),
                found: cells.len(),
            });
        }

        let observed_raw = cell_text(&cells[2]);
        let observed_at = parse_observed_at(&observed_raw)
            .ok_or_else(|| RowError::BadTimestamp(observed_raw.clone()))?;

        Ok(Self {
            entity_id: cell_u64(&cells[0], COLUMNS[0])?,
            entity_name: cell_text(&cells[1]),
            observed_at,
            effort_count: cell_u64(&cells[3], COLUMNS[3])?,
            athlete_count: cell_u64(&cells[4], COLUMNS[4])?,
        })
    }
}

/// True if the row's first cell is not an id (i.e. a header row).
pub fn is_header_row(cells: &[Value]) -> bool {
    cells
        .first()
        .map(|cell| cell_u64(cell, COLUMNS[0]).is_err())
        .unwrap_or(true)
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell_u64(cell: &Value, column: &'static str) -> Result<u64, RowError> {
    match cell {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or(RowError::NotAnInteger { column })
}
