// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Directory of captures.

use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::io::read_json;
use crate::ledger::{CaptureLedger, CaptureState, LedgerOptions};
use crate::paths::{CapturePaths, STATE_FILE};

/// Base directory holding one subdirectory per capture.
#[derive(Clone)]
pub struct CaptureStore {
    base: PathBuf,
    options: LedgerOptions,
}

impl CaptureStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_options(base, LedgerOptions::default())
    }

    pub fn with_options(base: impl Into<PathBuf>, options: LedgerOptions) -> Self {
        Self {
            base: base.into(),
            options,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn init(
        &self,
        capture_id: &str,
        task_config: Option<serde_json::Value>,
    ) -> Result<CaptureLedger, LedgerError> {
        CaptureLedger::init_with(&self.base, capture_id, task_config, self.options.clone())
    }

    pub fn open(&self, capture_id: &str) -> Result<CaptureLedger, LedgerError> {
        CaptureLedger::open_with(&self.base, capture_id, self.options.clone())
    }

    pub fn exists(&self, capture_id: &str) -> bool {
        CapturePaths::new(&self.base, capture_id)
            .state_path()
            .exists()
    }

    /// Status records of every capture under the base directory, newest first.
    ///
    /// Directories without a readable status record are skipped.
    pub fn list(&self) -> Result<Vec<CaptureState>, LedgerError> {
        let entries = match std::fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut states: Vec<CaptureState> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let path = entry.path().join(STATE_FILE);
                match read_json::<CaptureState>(&path) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "skipping capture dir");
                        None
                    }
                }
            })
            .collect();
        states.sort_by(|a, b| {
            b.metadata
                .started_at
                .cmp(&a.metadata.started_at)
                .then_with(|| a.capture_id.cmp(&b.capture_id))
        });
        Ok(states)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
