// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations.

pub mod import;
pub mod run;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tapdiff_capture::{CaptureStore, LedgerError, LedgerOptions, LockPolicy};
use thiserror::Error;

use crate::api_spec::{ApiSpec, SpecError};
use crate::cli::{Cli, Command};
use crate::config::{ConfigError, ProjectConfig};
use crate::diff::{DiffEngine, DiffError, DiffSessions, FilterError, SpecDiffEngine};
use crate::env;
use crate::proxy::ProxyError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Project settings plus the capture store they point at.
pub struct Project {
    pub config: ProjectConfig,
    pub store: CaptureStore,
}

impl Project {
    /// Load the project file if there is one. Without one, defaults apply
    /// relative to the working directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CommandError> {
        let config = ProjectConfig::discover(explicit)?.unwrap_or_else(|| ProjectConfig {
            root: PathBuf::from("."),
            ..ProjectConfig::default()
        });
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: ProjectConfig) -> Self {
        let store = CaptureStore::with_options(
            config.captures_dir(),
            LedgerOptions::default().with_lock_policy(lock_policy(env::lock_stale_ms())),
        );
        Self { config, store }
    }

    /// Diff engine for the project's specification. No specification means
    /// every endpoint is undocumented.
    pub fn engine(&self) -> Result<Arc<dyn DiffEngine>, CommandError> {
        let spec = match self.config.specification_path() {
            Some(path) => {
                let spec = ApiSpec::load(&path)?;
                tracing::debug!(path = %path.display(), endpoints = spec.len(), "specification loaded");
                spec
            }
            None => {
                tracing::debug!("no specification configured");
                ApiSpec::empty()
            }
        };
        Ok(Arc::new(SpecDiffEngine::new(spec)))
    }

    pub fn sessions(&self) -> Result<Arc<DiffSessions>, CommandError> {
        Ok(Arc::new(DiffSessions::new(self.store.clone(), self.engine()?)))
    }
}

/// Capture lock policy, with an optional staleness override in milliseconds.
fn lock_policy(stale_ms: Option<u64>) -> LockPolicy {
    match stale_ms {
        Some(ms) => LockPolicy::default()
            .with_stale_after(Duration::from_millis(ms))
            .outlasting_stale_locks(),
        None => LockPolicy::default(),
    }
}

/// Run the parsed command line. Returns the process exit code.
pub async fn execute(cli: Cli) -> Result<i32, CommandError> {
    let project = Project::load(cli.config.as_deref())?;
    match cli.command {
        Command::Run(args) => run::run(&project, &args).await,
        Command::Serve(args) => serve::serve(&project, &args).await.map(|()| 0),
        Command::Status(args) => status::status(&project, &args).await.map(|()| 0),
        Command::Import(args) => import::import(&project, &args).await.map(|()| 0),
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
