// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Diff sessions: one background worker per diff, tailing a capture.
//!
//! A worker walks the capture's interactions strictly in ledger order. It
//! reads the capture status before each scan, so once a scan that began on a
//! `completed` capture finds nothing new, every interaction has been seen.
//! Results are recorded before the matching progress event is published.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tapdiff_capture::{
    CaptureLedger, CaptureStatus, CaptureStore, Interaction, LedgerError, Pointer,
};
use thiserror::Error;
use tokio::sync::mpsc;

use super::engine::{DiffEngine, DiffOutcome};
use super::filter::{FilterError, RequestFilter};
use super::record::{DiffRecord, UndocumentedUrl};

/// How often a worker re-scans a capture that is still being written.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Diff session '{0}' not found")]
    NotFound(String),

    #[error("Diff session '{0}' already has a progress subscriber")]
    AlreadySubscribed(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Point-in-time counters for one diff session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    /// Interactions seen, whatever happened to them
    pub interactions_count: u64,
    /// Interactions compared with the specification
    pub processed_count: u64,
    /// Interactions matched by an ignore pattern
    pub filtered_count: u64,
    /// Unreadable interactions and engine failures
    pub skipped_count: u64,
    pub diffs_count: u64,
    pub undocumented_urls_count: u64,
    pub completed: bool,
}

/// Progress notification. Finite: always ends with `Completed`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ProgressEvent {
    Progress {
        pointer: Pointer,
        interactions_count: u64,
        diffs_count: u64,
        undocumented_urls_count: u64,
    },
    Error {
        pointer: Option<Pointer>,
        message: String,
    },
    Completed(DiffStats),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSessionInfo {
    pub diff_id: String,
    pub capture_id: String,
    pub completed: bool,
}

#[derive(Default)]
struct SessionState {
    diffs: Vec<DiffRecord>,
    undocumented: Vec<UndocumentedUrl>,
    undocumented_index: HashMap<(String, String), usize>,
    stats: DiffStats,
}

impl SessionState {
    fn apply(&mut self, outcome: DiffOutcome) {
        match outcome {
            DiffOutcome::Undocumented { method, path } => {
                let key = (method, path);
                match self.undocumented_index.get(&key) {
                    Some(&i) => self.undocumented[i].count += 1,
                    None => {
                        self.undocumented_index
                            .insert(key.clone(), self.undocumented.len());
                        self.undocumented.push(UndocumentedUrl {
                            method: key.0,
                            path: key.1,
                            count: 1,
                        });
                    }
                }
            }
            DiffOutcome::Diffs(diffs) => self.diffs.extend(diffs),
        }
        self.stats.diffs_count = self.diffs.len() as u64;
        self.stats.undocumented_urls_count = self.undocumented.len() as u64;
    }

    fn diffs(&self) -> &[DiffRecord] {
        &self.diffs
    }

    fn undocumented(&self) -> &[UndocumentedUrl] {
        &self.undocumented
    }

    fn progress(&self, pointer: Pointer) -> ProgressEvent {
        ProgressEvent::Progress {
            pointer,
            interactions_count: self.stats.interactions_count,
            diffs_count: self.stats.diffs_count,
            undocumented_urls_count: self.stats.undocumented_urls_count,
        }
    }
}

struct DiffSession {
    id: String,
    capture_id: String,
    state: Mutex<SessionState>,
    progress: Mutex<Option<mpsc::UnboundedReceiver<ProgressEvent>>>,
}

impl DiffSession {
    fn info(&self) -> DiffSessionInfo {
        DiffSessionInfo {
            diff_id: self.id.clone(),
            capture_id: self.capture_id.clone(),
            completed: self.state.lock().stats.completed,
        }
    }
}

/// Registry of diff sessions in this process.
pub struct DiffSessions {
    store: CaptureStore,
    engine: Arc<dyn DiffEngine>,
    poll_interval: Duration,
    sessions: RwLock<HashMap<String, Arc<DiffSession>>>,
}

impl DiffSessions {
    pub fn new(store: CaptureStore, engine: Arc<dyn DiffEngine>) -> Self {
        Self {
            store,
            engine,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    /// Start diffing a capture in the background and return the diff id.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_diff(&self, capture_id: &str, filter: RequestFilter) -> Result<String, DiffError> {
        let ledger = self.store.open(capture_id)?;
        let (events, progress) = mpsc::unbounded_channel();
        let session = Arc::new(DiffSession {
            id: uuid::Uuid::new_v4().to_string(),
            capture_id: capture_id.to_string(),
            state: Mutex::new(SessionState::default()),
            progress: Mutex::new(Some(progress)),
        });
        self.sessions
            .write()
            .insert(session.id.clone(), Arc::clone(&session));

        let worker = Arc::new(Worker {
            session: Arc::clone(&session),
            ledger,
            engine: Arc::clone(&self.engine),
            filter,
            events,
        });
        tokio::spawn(drive(worker, self.poll_interval));

        tracing::info!(diff_id = %session.id, capture_id, "diff session started");
        Ok(session.id.clone())
    }

    fn get(&self, diff_id: &str) -> Result<Arc<DiffSession>, DiffError> {
        self.sessions
            .read()
            .get(diff_id)
            .cloned()
            .ok_or_else(|| DiffError::NotFound(diff_id.to_string()))
    }

    /// Take the session's progress channel. Only one caller ever gets it.
    pub fn progress(
        &self,
        diff_id: &str,
    ) -> Result<mpsc::UnboundedReceiver<ProgressEvent>, DiffError> {
        self.get(diff_id)?
            .progress
            .lock()
            .take()
            .ok_or_else(|| DiffError::AlreadySubscribed(diff_id.to_string()))
    }

    /// Diffs recorded so far, read lazily.
    pub fn diffs(&self, diff_id: &str) -> Result<DiffsSnapshot, DiffError> {
        Ok(Snapshot::new(self.get(diff_id)?, SessionState::diffs))
    }

    /// Undocumented URLs seen so far, read lazily.
    ///
    /// The set of URLs is fixed when this is called; each count is read when
    /// its URL is reached.
    pub fn undocumented_urls(&self, diff_id: &str) -> Result<UndocumentedSnapshot, DiffError> {
        Ok(Snapshot::new(self.get(diff_id)?, SessionState::undocumented))
    }

    pub fn stats(&self, diff_id: &str) -> Result<DiffStats, DiffError> {
        Ok(self.get(diff_id)?.state.lock().stats.clone())
    }

    pub fn info(&self, diff_id: &str) -> Result<DiffSessionInfo, DiffError> {
        Ok(self.get(diff_id)?.info())
    }

    /// Forget a session. Its worker, if still running, finishes unobserved.
    pub fn invalidate(&self, diff_id: &str) -> bool {
        self.sessions.write().remove(diff_id).is_some()
    }

    pub fn list(&self) -> Vec<DiffSessionInfo> {
        let mut infos: Vec<_> = self.sessions.read().values().map(|s| s.info()).collect();
        infos.sort_by(|a, b| a.diff_id.cmp(&b.diff_id));
        infos
    }

    /// Consume the progress channel until the session completes.
    pub async fn wait(&self, diff_id: &str) -> Result<DiffStats, DiffError> {
        let mut progress = self.progress(diff_id)?;
        while let Some(event) = progress.recv().await {
            if let ProgressEvent::Completed(stats) = event {
                return Ok(stats);
            }
        }
        self.stats(diff_id)
    }
}

/// Records that existed when the snapshot was taken, cloned one at a time.
pub struct Snapshot<T> {
    session: Arc<DiffSession>,
    select: fn(&SessionState) -> &[T],
    next: usize,
    end: usize,
}

pub type DiffsSnapshot = Snapshot<DiffRecord>;
pub type UndocumentedSnapshot = Snapshot<UndocumentedUrl>;

impl<T> Snapshot<T> {
    fn new(session: Arc<DiffSession>, select: fn(&SessionState) -> &[T]) -> Self {
        let end = select(&session.state.lock()).len();
        Self {
            session,
            select,
            next: 0,
            end,
        }
    }
}

impl<T: Clone> Iterator for Snapshot<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.next >= self.end {
            return None;
        }
        let record = (self.select)(&self.session.state.lock())
            .get(self.next)
            .cloned();
        self.next += 1;
        record
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for Snapshot<T> {}

struct Worker {
    session: Arc<DiffSession>,
    ledger: CaptureLedger,
    engine: Arc<dyn DiffEngine>,
    filter: RequestFilter,
    events: mpsc::UnboundedSender<ProgressEvent>,
}

struct Scan {
    was_completed: bool,
    found: usize,
    last: Option<Pointer>,
}

impl Worker {
    fn publish(&self, event: ProgressEvent) {
        // A dropped receiver just means nobody is listening.
        let _ = self.events.send(event);
    }

    fn scan(&self, after: Option<Pointer>) -> Result<Scan, LedgerError> {
        let was_completed = self.ledger.load_status()?.status == CaptureStatus::Completed;
        let mut entries = self.ledger.entries_after(after.as_ref());
        let found = entries.len();
        while let Some(entry) = entries.next() {
            match entry {
                Ok(entry) => self.process(entry.pointer, entry.interaction),
                Err(e) => {
                    let Some(pointer) = entries.current().cloned() else {
                        continue;
                    };
                    if e.is_per_item() {
                        tracing::warn!(%pointer, error = %e, "skipping unreadable interaction");
                    } else {
                        tracing::error!(%pointer, error = %e, "failed to read interaction");
                    }
                    self.skip(pointer, e.to_string());
                }
            }
        }
        Ok(Scan {
            was_completed,
            found,
            last: entries.current().cloned(),
        })
    }

    fn process(&self, pointer: Pointer, interaction: Interaction) {
        let request = &interaction.request;
        if self.filter.ignores(&request.method, &request.path) {
            let event = {
                let mut state = self.session.state.lock();
                state.stats.interactions_count += 1;
                state.stats.filtered_count += 1;
                state.progress(pointer)
            };
            self.publish(event);
            return;
        }

        match self.engine.diff(&pointer, &interaction) {
            Ok(outcome) => {
                let event = {
                    let mut state = self.session.state.lock();
                    state.stats.interactions_count += 1;
                    state.stats.processed_count += 1;
                    state.apply(outcome);
                    state.progress(pointer)
                };
                self.publish(event);
            }
            Err(e) => {
                tracing::warn!(%pointer, error = %e, "diff engine failed");
                self.skip(pointer, e.to_string());
            }
        }
    }

    fn skip(&self, pointer: Pointer, message: String) {
        {
            let mut state = self.session.state.lock();
            state.stats.interactions_count += 1;
            state.stats.skipped_count += 1;
        }
        self.publish(ProgressEvent::Error {
            pointer: Some(pointer),
            message,
        });
    }

    fn complete(&self) {
        let stats = {
            let mut state = self.session.state.lock();
            state.stats.completed = true;
            state.stats.clone()
        };
        tracing::info!(
            diff_id = %self.session.id,
            interactions = stats.interactions_count,
            diffs = stats.diffs_count,
            undocumented = stats.undocumented_urls_count,
            "diff session completed"
        );
        self.publish(ProgressEvent::Completed(stats));
    }
}

async fn drive(worker: Arc<Worker>, poll_interval: Duration) {
    let mut cursor: Option<Pointer> = None;
    loop {
        let scanning = Arc::clone(&worker);
        let after = cursor.clone();
        let scan = match tokio::task::spawn_blocking(move || scanning.scan(after)).await {
            Ok(Ok(scan)) => scan,
            Ok(Err(e)) => {
                tracing::error!(diff_id = %worker.session.id, error = %e, "diff session failed");
                worker.publish(ProgressEvent::Error {
                    pointer: None,
                    message: e.to_string(),
                });
                break;
            }
            Err(e) => {
                tracing::error!(diff_id = %worker.session.id, error = %e, "diff worker panicked");
                worker.publish(ProgressEvent::Error {
                    pointer: None,
                    message: e.to_string(),
                });
                break;
            }
        };

        if scan.last.is_some() {
            cursor = scan.last;
        }
        if scan.found == 0 {
            if scan.was_completed {
                break;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
    worker.complete();
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
