// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Comparing one interaction against the specification.

use tapdiff_capture::{Body, Header, Interaction, Pointer};
use thiserror::Error;

use super::record::{DiffRecord, InteractionPart, InteractionTrail, SpecTrail};
use crate::api_spec::{media_type, normalize_path, ApiSpec};

#[derive(Debug, Error)]
pub enum DiffEngineError {
    #[error("Interaction {pointer} has no request method")]
    MissingMethod { pointer: Pointer },
}

/// What the engine concluded about one interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOutcome {
    /// No endpoint documents this (method, normalized path)
    Undocumented { method: String, path: String },
    /// The endpoint is documented; these are its mismatches (possibly none)
    Diffs(Vec<DiffRecord>),
}

/// Structural comparison of interactions with a specification.
pub trait DiffEngine: Send + Sync {
    fn diff(&self, pointer: &Pointer, interaction: &Interaction)
        -> Result<DiffOutcome, DiffEngineError>;
}

/// Endpoint-level comparison: methods, paths, statuses and media types.
/// Body shapes are never inspected.
#[derive(Debug)]
pub struct SpecDiffEngine {
    spec: ApiSpec,
}

impl SpecDiffEngine {
    pub fn new(spec: ApiSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }
}

impl DiffEngine for SpecDiffEngine {
    fn diff(
        &self,
        pointer: &Pointer,
        interaction: &Interaction,
    ) -> Result<DiffOutcome, DiffEngineError> {
        let request = &interaction.request;
        let response = &interaction.response;
        let method = request.method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return Err(DiffEngineError::MissingMethod {
                pointer: pointer.clone(),
            });
        }
        let path = normalize_path(&request.path);

        let Some(endpoint) = self.spec.find(&method, &path) else {
            return Ok(DiffOutcome::Undocumented { method, path });
        };

        let trail = |part: InteractionPart| InteractionTrail {
            pointer: pointer.clone(),
            part,
        };
        let spec_trail = |status: Option<u16>| SpecTrail {
            method: method.clone(),
            path: endpoint.path.clone(),
            status,
        };
        let mut diffs = Vec::new();

        if let Some(content_type) = body_content_type(&request.body, &request.headers) {
            if !endpoint.accepts_request_content_type(&content_type) {
                diffs.push(DiffRecord::UnmatchedRequestContentType {
                    interaction_trail: trail(InteractionPart::RequestBody {
                        content_type: Some(content_type),
                    }),
                    request_spec_trail: spec_trail(None),
                });
            }
        }

        if !endpoint.responses.is_empty() {
            match endpoint.response(response.status) {
                None => diffs.push(DiffRecord::UnmatchedResponseStatus {
                    interaction_trail: trail(InteractionPart::ResponseStatus {
                        status: response.status,
                    }),
                    request_spec_trail: spec_trail(None),
                }),
                Some(documented) => {
                    if let Some(content_type) =
                        body_content_type(&response.body, &response.headers)
                    {
                        if !documented.accepts_content_type(&content_type) {
                            diffs.push(DiffRecord::UnmatchedResponseContentType {
                                interaction_trail: trail(InteractionPart::ResponseBody {
                                    status: response.status,
                                    content_type: Some(content_type),
                                }),
                                request_spec_trail: spec_trail(Some(response.status)),
                            });
                        }
                    }
                }
            }
        }

        Ok(DiffOutcome::Diffs(diffs))
    }
}

/// Media type of a non-empty body, from the body record or its headers.
fn body_content_type(body: &Body, headers: &[Header]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    body.content_type
        .as_deref()
        .or_else(|| {
            headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("content-type"))
                .map(|h| h.value.as_str())
        })
        .map(media_type)
        .filter(|ct| !ct.is_empty())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
