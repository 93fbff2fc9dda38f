// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process advisory locking with staleness reclamation.
//!
//! A lock is a file whose existence means "held". It is created atomically
//! with its contents (temp file, then hard link), so a holder that crashes
//! leaves behind a complete record naming when it was taken. Once that
//! record is older than [`LockPolicy::stale_after`] the lock may be
//! reclaimed by anyone.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::LedgerError;

/// Minimal lock interface, kept small so tests can drive it directly.
pub trait AdvisoryLock: Send + Sync {
    /// Take the lock if nobody holds it. Never blocks.
    fn try_lock(&self) -> Result<bool, LedgerError>;

    /// Release the lock if this instance holds it.
    fn unlock(&self) -> Result<(), LedgerError>;

    /// Whether the current holder's record is older than the staleness threshold.
    fn is_stale(&self) -> Result<bool, LedgerError>;

    /// Remove a stale lock. Returns false if the lock changed hands meanwhile.
    fn reclaim(&self) -> Result<bool, LedgerError>;

    /// Path used in diagnostics.
    fn path(&self) -> &Path;
}

/// Timing parameters for acquiring a lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockPolicy {
    /// Age after which a held lock is presumed abandoned
    pub stale_after: Duration,

    /// Give up acquiring after this long
    pub timeout: Duration,

    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(250),
        }
    }
}

impl LockPolicy {
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Raise `timeout` so a waiter always outlives a crashed holder's lock
    /// and gets one more attempt after it turns stale.
    pub fn outlasting_stale_locks(mut self) -> Self {
        self.timeout = self.timeout.max(self.stale_after + self.max_backoff);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockRecord {
    owner: String,
    pid: u32,
    acquired_at_ms: u64,
}

/// Lock file owned by one process-local instance.
pub struct FileLock {
    path: PathBuf,
    owner: String,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl FileLock {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>, stale_after: Duration) -> Self {
        Self {
            path: path.into(),
            owner: uuid::Uuid::new_v4().to_string(),
            clock,
            stale_after,
        }
    }

    fn read_record(&self) -> Result<Option<LockRecord>, LedgerError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).ok().or(Some(LockRecord {
                // Unreadable records can never be released by their owner.
                owner: String::new(),
                pid: 0,
                acquired_at_ms: 0,
            }))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn record_is_stale(&self, record: &LockRecord) -> bool {
        let age = self
            .clock
            .now_millis()
            .saturating_sub(record.acquired_at_ms);
        age > self.stale_after.as_millis() as u64
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl AdvisoryLock for FileLock {
    fn try_lock(&self) -> Result<bool, LedgerError> {
        let record = LockRecord {
            owner: self.owner.clone(),
            pid: std::process::id(),
            acquired_at_ms: self.clock.now_millis(),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp-lock-")
            .tempfile_in(self.dir())?;
        serde_json::to_writer(tmp.as_file_mut(), &record)?;
        tmp.as_file_mut().flush()?;

        match std::fs::hard_link(tmp.path(), &self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn unlock(&self) -> Result<(), LedgerError> {
        match self.read_record()? {
            Some(record) if record.owner == self.owner => {
                match std::fs::remove_file(&self.path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            Some(record) => {
                tracing::warn!(
                    path = %self.path.display(),
                    holder_pid = record.pid,
                    "lock was reclaimed by another process before release"
                );
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn is_stale(&self) -> Result<bool, LedgerError> {
        Ok(self
            .read_record()?
            .is_some_and(|record| self.record_is_stale(&record)))
    }

    fn reclaim(&self) -> Result<bool, LedgerError> {
        let Some(seen) = self.read_record()? else {
            return Ok(true);
        };
        if !self.record_is_stale(&seen) {
            return Ok(false);
        }

        // Move the lock aside first so two reclaimers cannot both delete it.
        let tombstone = self
            .dir()
            .join(format!(".tmp-stale-{}", uuid::Uuid::new_v4()));
        match std::fs::rename(&self.path, &tombstone) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        }

        let moved: Option<LockRecord> = std::fs::read(&tombstone)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok());
        let reclaimed = match moved {
            Some(record) if record != seen && !self.record_is_stale(&record) => {
                // A fresh holder slipped in; hand its lock back.
                let _ = std::fs::hard_link(&tombstone, &self.path);
                false
            }
            _ => {
                tracing::warn!(
                    path = %self.path.display(),
                    stale_pid = seen.pid,
                    "reclaimed stale lock"
                );
                true
            }
        };
        let _ = std::fs::remove_file(&tombstone);
        Ok(reclaimed)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Releases the lock on drop.
pub struct LockGuard<'a, L: AdvisoryLock + ?Sized> {
    lock: &'a L,
}

impl<L: AdvisoryLock + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.unlock() {
            tracing::warn!(path = %self.lock.path().display(), error = %e, "failed to release lock");
        }
    }
}

/// Acquire `lock`, retrying with jittered exponential backoff.
///
/// Stale locks are reclaimed as they are found. Fails with
/// [`LedgerError::LockTimeout`] once `policy.timeout` has elapsed on `clock`.
pub fn acquire<'a, L: AdvisoryLock + ?Sized>(
    lock: &'a L,
    clock: &dyn Clock,
    policy: &LockPolicy,
) -> Result<LockGuard<'a, L>, LedgerError> {
    let started = clock.now_millis();
    let mut backoff = policy.initial_backoff;

    loop {
        if lock.try_lock()? {
            return Ok(LockGuard { lock });
        }
        if lock.is_stale()? && lock.reclaim()? {
            continue;
        }

        let waited_ms = clock.now_millis().saturating_sub(started);
        if waited_ms >= policy.timeout.as_millis() as u64 {
            return Err(LedgerError::LockTimeout {
                path: lock.path().to_path_buf(),
                waited_ms,
            });
        }

        let base = backoff.as_millis() as u64;
        let jitter = fastrand::u64(0..=base / 2);
        clock.sleep(Duration::from_millis(base + jitter));
        backoff = (backoff * 2).min(policy.max_backoff);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
