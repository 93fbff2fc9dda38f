// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Intercepting proxy and the subprocess it runs alongside.

pub mod forward;
pub mod orchestrator;
pub mod port;
pub mod subprocess;

use std::sync::Arc;
use tapdiff_capture::{CaptureLedger, Interaction, LedgerError};
use thiserror::Error;

pub use orchestrator::{Orchestrator, OrchestratorState, RunReport};
pub use port::Blocker;
pub use subprocess::CommandSpec;

/// Where the proxy listens and where it forwards to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    /// 0 picks any free port
    pub port: u16,
    /// Base URL for origin-form requests; absolute-form requests ignore it
    pub target: Option<reqwest::Url>,
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            target: None,
        }
    }

    pub fn with_target(mut self, target: reqwest::Url) -> Self {
        self.target = Some(target);
        self
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Port {port} is already in use{}", blocker.as_ref().map(|b| format!(" by {b}")).unwrap_or_default())]
    PortUnavailable { port: u16, blocker: Option<Blocker> },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Destination for captured interactions. Called from a blocking thread,
/// one sample at a time, in response-completion order.
pub trait SampleSink: Send + Sync {
    fn persist(&self, interaction: &Interaction) -> Result<(), LedgerError>;
}

impl SampleSink for CaptureLedger {
    fn persist(&self, interaction: &Interaction) -> Result<(), LedgerError> {
        self.append(interaction).map(|_| ())
    }
}

impl<S: SampleSink + ?Sized> SampleSink for Arc<S> {
    fn persist(&self, interaction: &Interaction) -> Result<(), LedgerError> {
        (**self).persist(interaction)
    }
}
