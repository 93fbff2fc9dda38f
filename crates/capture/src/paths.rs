// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Path computation for the on-disk capture layout.
//!
//! ```text
//! <base>/<capture-id>/
//!     capture-state.json        status record
//!     capture-state.json.lock   advisory lock (present while held)
//!     capture-summary.json      incremental counters
//!     interactions/<pointer>.json
//! ```

use std::path::{Path, PathBuf};

use crate::error::LedgerError;

pub const STATE_FILE: &str = "capture-state.json";
pub const SUMMARY_FILE: &str = "capture-summary.json";
pub const LOCK_FILE: &str = "capture-state.json.lock";
pub const INTERACTIONS_DIR: &str = "interactions";

/// Reject ids that could escape the base directory or collide with layout files.
pub fn validate_capture_id(capture_id: &str) -> Result<(), LedgerError> {
    let valid = !capture_id.is_empty()
        && capture_id.len() <= 128
        && !capture_id.starts_with('.')
        && capture_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(LedgerError::InvalidCaptureId(capture_id.to_string()))
    }
}

/// Paths for one capture directory.
#[derive(Clone, Debug)]
pub struct CapturePaths {
    root: PathBuf,
}

impl CapturePaths {
    pub fn new(base: &Path, capture_id: &str) -> Self {
        Self {
            root: base.join(capture_id),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn interactions_dir(&self) -> PathBuf {
        self.root.join(INTERACTIONS_DIR)
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
