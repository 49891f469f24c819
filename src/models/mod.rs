// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credential;
pub mod observation;
pub mod series;

pub use credential::Credential;
pub use observation::{Observation, RowError, SegmentStats, COLUMNS};
pub use series::{group_by_segment, SegmentSeries, SegmentSummary, SeriesPoint};
