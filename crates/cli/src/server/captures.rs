// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tapdiff_capture::{CaptureStatus, FinalizeOutcome, Interaction, Pointer};

use super::{blocking, ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct CaptureList {
    pub captures: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: CaptureStatus,
    pub diffs_count: u64,
    pub interactions_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct InteractionResponse {
    pub interaction: Interaction,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<CaptureList>, ApiError> {
    let store = state.sessions.store().clone();
    let states = blocking(move || store.list().map_err(ApiError::internal)).await?;
    Ok(Json(CaptureList {
        captures: states.into_iter().map(|s| s.capture_id).collect(),
    }))
}

pub async fn status(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let store = state.sessions.store().clone();
    blocking(move || {
        let ledger = store.open(&capture_id).map_err(ApiError::bad_request)?;
        let status = ledger.load_status().map_err(ApiError::bad_request)?;
        let summary = ledger.load_summary().map_err(ApiError::bad_request)?;
        Ok(Json(StatusResponse {
            status: status.status,
            diffs_count: summary.diffs_count,
            interactions_count: summary.interactions_count,
        }))
    })
    .await
}

/// Only `{"status": "completed"}` is accepted.
pub async fn update_status(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<StatusCode, ApiError> {
    if update.status != "completed" {
        return Err(ApiError::BadRequest(format!(
            "unsupported status {:?}, expected \"completed\"",
            update.status
        )));
    }
    let store = state.sessions.store().clone();
    blocking(move || {
        let ledger = store.open(&capture_id).map_err(ApiError::bad_request)?;
        match ledger.finalize().map_err(ApiError::internal)? {
            FinalizeOutcome::Finalized => tracing::info!(capture_id, "capture completed by request"),
            FinalizeOutcome::AlreadyCompleted => {
                tracing::debug!(capture_id, "capture was already completed")
            }
        }
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

pub async fn interaction(
    State(state): State<AppState>,
    Path((capture_id, pointer)): Path<(String, String)>,
) -> Result<Json<InteractionResponse>, ApiError> {
    let pointer: Pointer = pointer
        .parse()
        .map_err(|_| ApiError::NotFound(format!("interaction {pointer} not found")))?;
    let store = state.sessions.store().clone();
    blocking(move || {
        let ledger = store
            .open(&capture_id)
            .map_err(|e| ApiError::NotFound(e.to_string()))?;
        let interaction = ledger.resolve(&pointer).map_err(|e| {
            if e.is_not_found() {
                ApiError::NotFound(e.to_string())
            } else {
                ApiError::internal(e)
            }
        })?;
        Ok(Json(InteractionResponse { interaction }))
    })
    .await
}
