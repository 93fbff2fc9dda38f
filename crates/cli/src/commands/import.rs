// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tapdiff import <file>`

use std::path::Path;
use tapdiff_capture::{CaptureStore, Interaction};

use super::{CommandError, Project};
use crate::cli::ImportArgs;
use crate::output::print_info;

/// Import into a new capture and print its id on stdout.
pub async fn import(project: &Project, args: &ImportArgs) -> Result<(), CommandError> {
    let capture_id = args
        .capture_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let store = project.store.clone();
    let file = args.file.clone();
    let id = capture_id.clone();
    let count = tokio::task::spawn_blocking(move || import_file(&store, &id, &file)).await??;

    print_info(format_args!("Imported {count} interactions"));
    println!("{capture_id}");
    Ok(())
}

/// Load a JSON array of interactions into a new, completed capture.
pub fn import_file(store: &CaptureStore, capture_id: &str, file: &Path) -> Result<usize, CommandError> {
    let content = std::fs::read(file)?;
    let interactions: Vec<Interaction> =
        serde_json::from_slice(&content).map_err(|source| CommandError::Parse {
            path: file.to_path_buf(),
            source,
        })?;

    let metadata = serde_json::json!({ "import": file.display().to_string() });
    let ledger = store.init(capture_id, Some(metadata))?;
    for interaction in &interactions {
        ledger.append(interaction)?;
    }
    ledger.finalize()?;
    tracing::info!(capture_id, count = interactions.len(), "import finished");
    Ok(interactions.len())
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
