// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local append-only store: one JSON array per line, columns in table order.

use super::{rows_to_observations, ObservationStore};
use crate::error::StoreError;
use crate::models::Observation;
use async_trait::async_trait;
use serde_json::Value;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// JSON-lines file store.
#[derive(Debug, Clone)]
pub struct FileObservationStore {
    path: PathBuf,
}

impl FileObservationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the file is non-empty and its last line was cut short.
    async fn ends_mid_line(&self) -> Result<bool, StoreError> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if file.metadata().await?.len() == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        Ok(last[0] != b'\n')
    }
}

#[async_trait]
impl ObservationStore for FileObservationStore {
    async fn append_row(&self, observation: &Observation) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = String::new();
        if self.ends_mid_line().await? {
            line.push('\n');
        }
        line.push_str(
            &serde_json::to_string(&observation.to_row())
                .map_err(|e| StoreError::Malformed(e.to_string()))?,
        );
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Observation>, StoreError> {
        // Bytes, not a string: a torn write can split a multibyte character.
        let contents = match tokio::fs::read(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let rows: Vec<Vec<Value>> = contents
            .split(|&b| b == b'\n')
            .enumerate()
            .filter(|(_, line)| !line.trim_ascii().is_empty())
            .filter_map(|(index, line)| {
                let parsed = std::str::from_utf8(line)
                    .map_err(|e| e.to_string())
                    .and_then(|line| {
                        serde_json::from_str::<Vec<Value>>(line).map_err(|e| e.to_string())
                    });
                match parsed {
                    Ok(row) => Some(row),
                    Err(e) => {
                        tracing::warn!(line = index + 1, error = %e, "Skipping unreadable line");
                        None
                    }
                }
            })
            .collect();

        Ok(rows_to_observations(&rows))
    }
}
