// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP control surface over a captures directory.
//!
//! | Route | |
//! |---|---|
//! | `GET /captures` | capture ids, newest first |
//! | `GET`/`PUT /captures/{id}/status` | status and counters; `PUT` completes |
//! | `GET`/`POST /captures/{id}/diffs` | list or start diff sessions |
//! | `DELETE /captures/{id}/diffs/{diff}` | drop a diff session |
//! | `GET /captures/{id}/diffs/{diff}/notifications` | progress as server-sent events |
//! | `GET /captures/{id}/diffs/{diff}/diffs` | streamed array of diffs |
//! | `GET /captures/{id}/diffs/{diff}/undocumented-urls` | streamed `{"urls":[...]}` |
//! | `GET /captures/{id}/diffs/{diff}/stats` | session counters |
//! | `GET /captures/{id}/interactions/{pointer}` | one stored interaction |

mod captures;
mod diffs;
mod error;

use axum::routing::{delete, get};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::diff::DiffSessions;

pub use error::ApiError;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<DiffSessions>,
    /// Project-level ignore patterns, applied to every diff session
    pub ignore_requests: Arc<[String]>,
}

impl AppState {
    pub fn new(sessions: Arc<DiffSessions>) -> Self {
        Self {
            sessions,
            ignore_requests: Arc::from(Vec::new()),
        }
    }

    pub fn with_ignore_requests(mut self, patterns: Vec<String>) -> Self {
        self.ignore_requests = Arc::from(patterns);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/captures", get(captures::list))
        .route(
            "/captures/{capture_id}/status",
            get(captures::status).put(captures::update_status),
        )
        .route(
            "/captures/{capture_id}/interactions/{pointer}",
            get(captures::interaction),
        )
        .route(
            "/captures/{capture_id}/diffs",
            get(diffs::list).post(diffs::start),
        )
        .route(
            "/captures/{capture_id}/diffs/{diff_id}",
            delete(diffs::invalidate),
        )
        .route(
            "/captures/{capture_id}/diffs/{diff_id}/notifications",
            get(diffs::notifications),
        )
        .route("/captures/{capture_id}/diffs/{diff_id}/diffs", get(diffs::diffs))
        .route(
            "/captures/{capture_id}/diffs/{diff_id}/undocumented-urls",
            get(diffs::undocumented_urls),
        )
        .route("/captures/{capture_id}/diffs/{diff_id}/stats", get(diffs::stats))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(addr = %listener.local_addr()?, "control server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Run blocking ledger I/O off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
