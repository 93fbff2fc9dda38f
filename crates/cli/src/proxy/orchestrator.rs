// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runs the proxy next to the user's command.
//!
//! ```text
//! idle -> proxy-bound -> command-running | passive-listening -> shutting-down -> stopped
//! ```
//!
//! Samples flow from request handlers over a bounded channel to a single
//! consumer, which persists them one at a time. Persistence order is
//! therefore response-completion order.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tapdiff_capture::Interaction;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tower_http::trace::TraceLayer;

use super::forward::{self, ForwardState};
use super::subprocess::{self, CommandSpec};
use super::{port, ProxyConfig, ProxyError, SampleSink};

/// Samples allowed in flight between handlers and the consumer.
pub const SAMPLE_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    ProxyBound(SocketAddr),
    CommandRunning(SocketAddr),
    PassiveListening(SocketAddr),
    ShuttingDown,
    Stopped,
}

/// What a finished run observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub addr: SocketAddr,
    /// `None` when no command was run
    pub exit_code: Option<i32>,
    pub samples: u64,
    pub sink_failures: u64,
}

pub struct Orchestrator {
    config: ProxyConfig,
    listener: Option<TcpListener>,
    state: watch::Sender<OrchestratorState>,
    body_limit: usize,
}

impl Orchestrator {
    pub fn new(config: ProxyConfig) -> Self {
        let (state, _) = watch::channel(OrchestratorState::Idle);
        Self {
            config,
            listener: None,
            state,
            body_limit: forward::DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    /// Bind the listener. Idempotent; a failure is final.
    pub async fn bind(&mut self) -> Result<SocketAddr, ProxyError> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }
        let listener = port::bind(&self.config.host, self.config.port).await?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        self.state.send_replace(OrchestratorState::ProxyBound(addr));
        tracing::info!(%addr, "proxy bound");
        Ok(addr)
    }

    /// Serve until `command` exits, or until `stop` resolves when there is
    /// no command. Binds first if [`bind`](Self::bind) was not called.
    pub async fn run<F>(
        mut self,
        sink: Arc<dyn SampleSink>,
        command: Option<CommandSpec>,
        stop: F,
    ) -> Result<RunReport, ProxyError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = self.bind().await?;
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => port::bind(&self.config.host, addr.port()).await?,
        };

        let (samples_tx, samples_rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        let consumer = tokio::spawn(consume(samples_rx, sink));

        let app = forward::router(
            ForwardState::new(forward::client()?, self.config.target.clone(), samples_tx)
                .with_body_limit(self.body_limit),
        )
        .layer(TraceLayer::new_for_http());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = self.drive(addr, command, stop).await;

        self.state.send_replace(OrchestratorState::ShuttingDown);
        tracing::debug!(%addr, "draining proxy");
        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "proxy server failed"),
            Err(e) => tracing::warn!(error = %e, "proxy server task failed"),
        }
        let (samples, sink_failures) = consumer.await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "sample consumer failed");
            (0, 0)
        });
        self.state.send_replace(OrchestratorState::Stopped);
        tracing::info!(%addr, samples, sink_failures, "proxy stopped");

        Ok(RunReport {
            addr,
            exit_code: outcome?,
            samples,
            sink_failures,
        })
    }

    async fn drive<F>(
        &self,
        addr: SocketAddr,
        command: Option<CommandSpec>,
        stop: F,
    ) -> Result<Option<i32>, ProxyError>
    where
        F: Future<Output = ()> + Send,
    {
        let Some(spec) = command else {
            self.state.send_replace(OrchestratorState::PassiveListening(addr));
            tracing::info!(%addr, "listening until stopped");
            stop.await;
            return Ok(None);
        };

        let mut child = subprocess::spawn(&spec, addr)?;
        self.state.send_replace(OrchestratorState::CommandRunning(addr));
        tracing::info!(command = %spec.command, pid = child.id(), "command started");

        tokio::pin!(stop);
        let status = tokio::select! {
            status = child.wait() => status?,
            () = &mut stop => {
                tracing::info!("stop requested, killing command");
                let _ = child.start_kill();
                child.wait().await?
            }
        };
        let code = subprocess::exit_code(status);
        tracing::info!(command = %spec.command, code, "command exited");
        Ok(Some(code))
    }
}

/// Persist samples in arrival order. Returns (persisted, failed).
async fn consume(
    mut samples: mpsc::Receiver<Interaction>,
    sink: Arc<dyn SampleSink>,
) -> (u64, u64) {
    let mut persisted = 0;
    let mut failed = 0;
    while let Some(sample) = samples.recv().await {
        let sink = Arc::clone(&sink);
        let uuid = sample.uuid.clone();
        match tokio::task::spawn_blocking(move || sink.persist(&sample)).await {
            Ok(Ok(())) => {
                persisted += 1;
                tracing::debug!(%uuid, "sample persisted");
            }
            Ok(Err(e)) => {
                failed += 1;
                tracing::warn!(%uuid, error = %e, "failed to persist sample");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(%uuid, error = %e, "sample persistence panicked");
            }
        }
    }
    (persisted, failed)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
