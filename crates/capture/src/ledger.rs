// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capture ledger implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::interaction::Interaction;
use crate::io::{read_json, write_json_atomic};
use crate::lock::{acquire, FileLock, LockGuard, LockPolicy};
use crate::paths::{validate_capture_id, CapturePaths};
use crate::pointer::{Pointer, PointerStore};

/// Capture lifecycle. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Started,
    Completed,
}

/// Persisted status record (`capture-state.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureState {
    pub capture_id: String,
    pub status: CaptureStatus,
    pub metadata: CaptureMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureMetadata {
    pub started_at: DateTime<Utc>,
    pub task_config: Option<serde_json::Value>,
    pub last_interaction: Option<Pointer>,
}

/// Incrementally maintained counters (`capture-summary.json`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    pub diffs_count: u64,
    pub interactions_count: u64,
}

/// Result of [`CaptureLedger::finalize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// This call moved the capture to `completed`
    Finalized,
    /// Someone else had already completed it
    AlreadyCompleted,
}

/// One stored interaction with its address.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerEntry {
    pub pointer: Pointer,
    pub interaction: Interaction,
}

/// Knobs for tests and for processes that need a different lock policy.
#[derive(Clone)]
pub struct LedgerOptions {
    pub clock: Arc<dyn Clock>,
    pub lock: LockPolicy,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            clock: SystemClock::shared(),
            lock: LockPolicy::default(),
        }
    }
}

impl LedgerOptions {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_lock_policy(mut self, lock: LockPolicy) -> Self {
        self.lock = lock;
        self
    }
}

/// Append-only persistence for one capture session.
///
/// Appends may come from many threads. They share `writes` for reading so
/// that `finalize`, which takes it for writing, only flips the status once
/// every accepted append has returned. Summary and status updates go through
/// the capture's advisory lock so separate processes never interleave them.
pub struct CaptureLedger {
    capture_id: String,
    paths: CapturePaths,
    store: PointerStore,
    lock: FileLock,
    options: LedgerOptions,
    writes: RwLock<()>,
    local: Mutex<()>,
}

impl std::fmt::Debug for CaptureLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLedger")
            .field("capture_id", &self.capture_id)
            .finish_non_exhaustive()
    }
}

impl CaptureLedger {
    /// Create the capture layout, or reopen it if it already exists with the
    /// same task configuration.
    pub fn init(
        base: &Path,
        capture_id: &str,
        task_config: Option<serde_json::Value>,
    ) -> Result<Self, LedgerError> {
        Self::init_with(base, capture_id, task_config, LedgerOptions::default())
    }

    pub fn init_with(
        base: &Path,
        capture_id: &str,
        task_config: Option<serde_json::Value>,
        options: LedgerOptions,
    ) -> Result<Self, LedgerError> {
        validate_capture_id(capture_id)?;
        let paths = CapturePaths::new(base, capture_id);
        std::fs::create_dir_all(paths.interactions_dir())?;
        let ledger = Self::assemble(capture_id, paths, options)?;

        {
            let _guard = ledger.lock_summary()?;
            let state_path = ledger.paths.state_path();
            if state_path.exists() {
                let state: CaptureState = read_json(&state_path)?;
                if state.metadata.task_config != task_config {
                    return Err(LedgerError::AlreadyInitializedWithDifferentConfig {
                        capture_id: capture_id.to_string(),
                    });
                }
                ledger.reconcile_summary()?;
            } else {
                let state = CaptureState {
                    capture_id: capture_id.to_string(),
                    status: CaptureStatus::Started,
                    metadata: CaptureMetadata {
                        started_at: ledger.now(),
                        task_config,
                        last_interaction: None,
                    },
                };
                write_json_atomic(&ledger.paths.summary_path(), &CaptureSummary::default())?;
                write_json_atomic(&state_path, &state)?;
                ledger.reconcile_summary()?;
                tracing::info!(capture_id, dir = %ledger.paths.root().display(), "capture initialized");
            }
        }

        Ok(ledger)
    }

    /// Open an existing capture without touching its files or directories.
    pub fn open(base: &Path, capture_id: &str) -> Result<Self, LedgerError> {
        Self::open_with(base, capture_id, LedgerOptions::default())
    }

    pub fn open_with(
        base: &Path,
        capture_id: &str,
        options: LedgerOptions,
    ) -> Result<Self, LedgerError> {
        validate_capture_id(capture_id)?;
        let paths = CapturePaths::new(base, capture_id);
        if !paths.state_path().exists() {
            return Err(LedgerError::NotFound(format!("capture {capture_id}")));
        }
        Self::assemble(capture_id, paths, options)
    }

    fn assemble(
        capture_id: &str,
        paths: CapturePaths,
        options: LedgerOptions,
    ) -> Result<Self, LedgerError> {
        let store = PointerStore::open(paths.interactions_dir())?;
        let lock = FileLock::new(
            paths.lock_path(),
            Arc::clone(&options.clock),
            options.lock.stale_after,
        );
        Ok(Self {
            capture_id: capture_id.to_string(),
            paths,
            store,
            lock,
            options,
            writes: RwLock::new(()),
            local: Mutex::new(()),
        })
    }

    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    pub fn dir(&self) -> &Path {
        self.paths.root()
    }

    pub fn interactions_dir(&self) -> PathBuf {
        self.paths.interactions_dir()
    }

    /// Durably store an interaction and bump the summary counter.
    pub fn append(&self, interaction: &Interaction) -> Result<Pointer, LedgerError> {
        let _writing = self.writes.read();
        let _guard = self.lock_summary()?;

        let mut state = self.load_status()?;
        if state.status == CaptureStatus::Completed {
            return Err(LedgerError::CaptureCompleted(self.capture_id.clone()));
        }

        let pointer = self.store.save(interaction)?;

        let mut summary = self.load_summary()?;
        summary.interactions_count += 1;
        write_json_atomic(&self.paths.summary_path(), &summary)?;

        state.metadata.last_interaction = Some(pointer.clone());
        write_json_atomic(&self.paths.state_path(), &state)?;

        tracing::debug!(capture_id = %self.capture_id, %pointer, "interaction appended");
        Ok(pointer)
    }

    /// Add to the capture's diff counter.
    pub fn add_diffs(&self, count: u64) -> Result<(), LedgerError> {
        if count == 0 {
            return Ok(());
        }
        let _guard = self.lock_summary()?;
        let mut summary = self.load_summary()?;
        summary.diffs_count += count;
        write_json_atomic(&self.paths.summary_path(), &summary)
    }

    /// Mark the capture completed. Idempotent.
    pub fn finalize(&self) -> Result<FinalizeOutcome, LedgerError> {
        let _exclusive = self.writes.write();
        let _guard = self.lock_summary()?;

        let mut state = self.load_status()?;
        if state.status == CaptureStatus::Completed {
            return Ok(FinalizeOutcome::AlreadyCompleted);
        }
        state.status = CaptureStatus::Completed;
        write_json_atomic(&self.paths.state_path(), &state)?;

        tracing::info!(capture_id = %self.capture_id, "capture completed");
        Ok(FinalizeOutcome::Finalized)
    }

    pub fn load_status(&self) -> Result<CaptureState, LedgerError> {
        read_json(&self.paths.state_path())
    }

    pub fn load_summary(&self) -> Result<CaptureSummary, LedgerError> {
        match read_json(&self.paths.summary_path()) {
            Err(LedgerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(CaptureSummary::default())
            }
            other => other,
        }
    }

    /// Look up one interaction.
    pub fn resolve(&self, pointer: &Pointer) -> Result<Interaction, LedgerError> {
        self.store.resolve(pointer)
    }

    /// Stored interactions strictly after `after`, in append order.
    ///
    /// The set of pointers is fixed when this is called; each envelope is
    /// read lazily. Bad envelopes come through as per-item errors.
    pub fn entries_after(&self, after: Option<&Pointer>) -> Entries<'_> {
        Entries {
            store: &self.store,
            pointers: self.store.pointers_after(after).into_iter(),
            current: None,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let millis = self.options.clock.now_millis();
        i64::try_from(millis)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
    }

    fn lock_summary(&self) -> Result<LockGuard<'_, FileLock>, LedgerError> {
        let _local = self.local.lock();
        acquire(&self.lock, self.options.clock.as_ref(), &self.options.lock)
    }

    /// Repair `interactionsCount` after a crash between an envelope write and
    /// the counter update. Caller holds the lock.
    fn reconcile_summary(&self) -> Result<(), LedgerError> {
        let mut summary = self.load_summary()?;
        let on_disk = self.store.count();
        if summary.interactions_count != on_disk {
            tracing::warn!(
                capture_id = %self.capture_id,
                recorded = summary.interactions_count,
                on_disk,
                "interaction count drifted, reconciling"
            );
            summary.interactions_count = on_disk;
            write_json_atomic(&self.paths.summary_path(), &summary)?;
        }
        Ok(())
    }
}

/// Lazy, ordered scan over stored interactions.
pub struct Entries<'a> {
    store: &'a PointerStore,
    pointers: std::vec::IntoIter<Pointer>,
    current: Option<Pointer>,
}

impl Entries<'_> {
    /// Pointer of the item most recently yielded, whether it resolved or not.
    pub fn current(&self) -> Option<&Pointer> {
        self.current.as_ref()
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<LedgerEntry, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let pointer = self.pointers.next()?;
        self.current = Some(pointer.clone());
        Some(
            self.store
                .resolve(&pointer)
                .map(|interaction| LedgerEntry {
                    pointer,
                    interaction,
                }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pointers.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_> {}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
