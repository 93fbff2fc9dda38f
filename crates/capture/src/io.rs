// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! IO helpers for JSON records written with temp-file-then-rename.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::LedgerError;

/// Read and decode a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LedgerError> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

/// Write a JSON record so readers see either the old or the new contents.
///
/// The record is written to a temp file in the destination directory,
/// flushed to disk, then renamed over `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), LedgerError> {
    let dir = parent_dir(path);
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), value)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| LedgerError::Io(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Iterate over file paths in a directory.
///
/// Silently skips entries that can't be read. Returns an empty iterator if the
/// directory doesn't exist or can't be read.
pub fn files_in(dir: &Path) -> impl Iterator<Item = PathBuf> {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
}

/// Iterate over JSON file paths in a directory.
///
/// Temp files left behind by interrupted writes start with `.tmp-` and carry
/// no extension, so they never show up here.
pub fn json_files_in(dir: &Path) -> impl Iterator<Item = PathBuf> {
    files_in(dir).filter(|p| p.extension().is_some_and(|e| e == "json"))
}
