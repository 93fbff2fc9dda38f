// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Interaction envelopes and the pointers that address them.
//!
//! Each interaction is stored as `<pointer>.json` inside a capture's
//! `interactions/` directory. A pointer is the append sequence number
//! rendered as a fixed-width decimal, so sorting pointer strings sorts
//! interactions by append order.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::interaction::Interaction;
use crate::io::json_files_in;

const POINTER_WIDTH: usize = 20;

/// Stable, lexically sortable address of one stored interaction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pointer(String);

impl Pointer {
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("{seq:0width$}", width = POINTER_WIDTH))
    }

    pub fn seq(&self) -> u64 {
        // Validated on construction.
        self.0.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl FromStr for Pointer {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == POINTER_WIDTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(LedgerError::InvalidPointer(s.to_string()))
        }
    }
}

impl TryFrom<String> for Pointer {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pointer> for String {
    fn from(pointer: Pointer) -> Self {
        pointer.0
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Envelope directory for one capture.
///
/// `save` is atomic per interaction. The sequence counter resumes after the
/// highest pointer already on disk, and a name collision with another writer
/// moves on to the next number instead of overwriting.
#[derive(Debug)]
pub struct PointerStore {
    dir: PathBuf,
    next: AtomicU64,
}

impl PointerStore {
    /// Open the envelope directory without creating it. A missing directory
    /// reads as empty.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let dir = dir.into();
        let next = scan_pointers(&dir)
            .last()
            .map(|p| p.seq() + 1)
            .unwrap_or(0);
        Ok(Self {
            dir,
            next: AtomicU64::new(next),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Durably write an envelope and return its pointer.
    pub fn save(&self, interaction: &Interaction) -> Result<Pointer, LedgerError> {
        let bytes = serde_json::to_vec(interaction)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempfile_in(&self.dir)?;
        tmp.as_file_mut().write_all(&bytes)?;
        tmp.as_file().sync_all()?;

        loop {
            let pointer = Pointer::from_seq(self.next.fetch_add(1, Ordering::SeqCst));
            match tmp.persist_noclobber(self.dir.join(pointer.file_name())) {
                Ok(_) => return Ok(pointer),
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::debug!(%pointer, "pointer taken by another writer, retrying");
                    tmp = e.file;
                }
                Err(e) => return Err(LedgerError::Io(e.error)),
            }
        }
    }

    /// Load the interaction a pointer refers to.
    pub fn resolve(&self, pointer: &Pointer) -> Result<Interaction, LedgerError> {
        let path = self.dir.join(pointer.file_name());
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(format!("interaction {pointer}")));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::CorruptEntry {
            pointer: pointer.to_string(),
            reason: e.to_string(),
        })
    }

    /// All stored pointers in append order.
    pub fn pointers(&self) -> Vec<Pointer> {
        scan_pointers(&self.dir)
    }

    /// Stored pointers strictly after `after`, in append order.
    pub fn pointers_after(&self, after: Option<&Pointer>) -> Vec<Pointer> {
        let mut pointers = self.pointers();
        if let Some(after) = after {
            pointers.retain(|p| p > after);
        }
        pointers
    }

    /// Number of envelopes on disk.
    pub fn count(&self) -> u64 {
        self.pointers().len() as u64
    }
}

fn scan_pointers(dir: &Path) -> Vec<Pointer> {
    let mut pointers: Vec<Pointer> = json_files_in(dir)
        .filter_map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
        })
        .collect();
    pointers.sort();
    pointers
}

#[cfg(test)]
#[path = "pointer_tests.rs"]
mod tests;
