// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{blocking, ApiError, AppState};
use crate::diff::{DiffSessionInfo, DiffStats, ProgressEvent, RequestFilter};
use crate::stream::{array_stream, stringify_stream, wrapped_array_stream, Token};

/// Tokens rendered per response chunk.
const TOKENS_PER_CHUNK: usize = 512;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartDiffRequest {
    pub filters: Vec<String>,
    pub ignore_requests: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDiffResponse {
    pub diff_id: String,
    pub notifications_url: String,
}

pub async fn start(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
    body: Option<Json<StartDiffRequest>>,
) -> Result<Json<StartDiffResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let patterns: Vec<String> = state
        .ignore_requests
        .iter()
        .chain(&request.ignore_requests)
        .chain(&request.filters)
        .cloned()
        .collect();
    let sessions = state.sessions.clone();
    let id = capture_id.clone();
    let diff_id = blocking(move || {
        let filter = RequestFilter::parse(&patterns).map_err(ApiError::internal)?;
        sessions.start_diff(&id, filter).map_err(ApiError::internal)
    })
    .await?;

    Ok(Json(StartDiffResponse {
        notifications_url: format!("/captures/{capture_id}/diffs/{diff_id}/notifications"),
        diff_id,
    }))
}

#[derive(Debug, Serialize)]
pub struct DiffSessionList {
    pub diffs: Vec<DiffSessionInfo>,
}

/// Live diff sessions over this capture.
pub async fn list(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> Json<DiffSessionList> {
    let diffs = state
        .sessions
        .list()
        .into_iter()
        .filter(|info| info.capture_id == capture_id)
        .collect();
    Json(DiffSessionList { diffs })
}

/// Drop a session and everything it has accumulated.
pub async fn invalidate(
    State(state): State<AppState>,
    Path((capture_id, diff_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    session_for(&state, &capture_id, &diff_id)?;
    state.sessions.invalidate(&diff_id);
    tracing::info!(capture_id, diff_id, "diff session invalidated");
    Ok(StatusCode::NO_CONTENT)
}

/// Check the diff exists and belongs to this capture.
fn session_for(state: &AppState, capture_id: &str, diff_id: &str) -> Result<(), ApiError> {
    let info = state.sessions.info(diff_id)?;
    if info.capture_id != capture_id {
        return Err(ApiError::NotFound(format!(
            "Diff session '{diff_id}' not found for capture '{capture_id}'"
        )));
    }
    Ok(())
}

pub async fn notifications(
    State(state): State<AppState>,
    Path((capture_id, diff_id)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    session_for(&state, &capture_id, &diff_id)?;
    let progress = state.sessions.progress(&diff_id)?;
    let events = UnboundedReceiverStream::new(progress)
        .map(|event| Event::default().json_data(notification(&event)));
    Ok(Sse::new(events))
}

/// Wire form of a progress event. `progress` goes out as `message`.
pub fn notification(event: &ProgressEvent) -> Value {
    let mut value = serde_json::to_value(event).unwrap_or(Value::Null);
    if let Some(kind) = value.get_mut("type") {
        if *kind == "progress" {
            *kind = Value::from("message");
        }
    }
    value
}

pub async fn diffs(
    State(state): State<AppState>,
    Path((capture_id, diff_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    session_for(&state, &capture_id, &diff_id)?;
    let snapshot = state.sessions.diffs(&diff_id)?;
    Ok(json_stream(array_stream(stream::iter(snapshot))))
}

pub async fn undocumented_urls(
    State(state): State<AppState>,
    Path((capture_id, diff_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    session_for(&state, &capture_id, &diff_id)?;
    let urls = state.sessions.undocumented_urls(&diff_id)?;
    Ok(json_stream(wrapped_array_stream("urls", stream::iter(urls))))
}

pub async fn stats(
    State(state): State<AppState>,
    Path((capture_id, diff_id)): Path<(String, String)>,
) -> Result<Json<DiffStats>, ApiError> {
    session_for(&state, &capture_id, &diff_id)?;
    Ok(Json(state.sessions.stats(&diff_id)?))
}

fn json_stream<S>(tokens: S) -> Response
where
    S: Stream<Item = Token> + Send + 'static,
{
    let chunks = stringify_stream(tokens, TOKENS_PER_CHUNK).map(Ok::<_, Infallible>);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(chunks),
    )
        .into_response()
}

#[cfg(test)]
#[path = "diffs_tests.rs"]
mod tests;
