// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pointer store, the advisory lock and the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    /// An envelope exists but cannot be decoded. Readers skip these.
    #[error("corrupt entry {pointer}: {reason}")]
    CorruptEntry { pointer: String, reason: String },

    #[error("timed out after {waited_ms}ms waiting for lock {}", path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    #[error("capture {capture_id} was already initialized with a different configuration")]
    AlreadyInitializedWithDifferentConfig { capture_id: String },

    #[error("capture {0} is already completed")]
    CaptureCompleted(String),

    #[error("invalid capture id: {0:?}")]
    InvalidCaptureId(String),

    #[error("invalid pointer: {0:?}")]
    InvalidPointer(String),
}

impl LedgerError {
    /// Whether this error concerns a single stored item rather than the capture.
    pub fn is_per_item(&self) -> bool {
        matches!(self, Self::CorruptEntry { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
