// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Diff results.

use serde::{Deserialize, Serialize};
use tapdiff_capture::Pointer;

/// One mismatch between an interaction and the specification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum DiffRecord {
    /// The endpoint documents responses, but not this status
    UnmatchedResponseStatus {
        interaction_trail: InteractionTrail,
        request_spec_trail: SpecTrail,
    },
    /// The request body's media type is not documented
    UnmatchedRequestContentType {
        interaction_trail: InteractionTrail,
        request_spec_trail: SpecTrail,
    },
    /// The response body's media type is not documented for its status
    UnmatchedResponseContentType {
        interaction_trail: InteractionTrail,
        request_spec_trail: SpecTrail,
    },
}

impl DiffRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnmatchedResponseStatus { .. } => "UnmatchedResponseStatus",
            Self::UnmatchedRequestContentType { .. } => "UnmatchedRequestContentType",
            Self::UnmatchedResponseContentType { .. } => "UnmatchedResponseContentType",
        }
    }

    pub fn interaction_trail(&self) -> &InteractionTrail {
        match self {
            Self::UnmatchedResponseStatus {
                interaction_trail, ..
            }
            | Self::UnmatchedRequestContentType {
                interaction_trail, ..
            }
            | Self::UnmatchedResponseContentType {
                interaction_trail, ..
            } => interaction_trail,
        }
    }

    pub fn request_spec_trail(&self) -> &SpecTrail {
        match self {
            Self::UnmatchedResponseStatus {
                request_spec_trail, ..
            }
            | Self::UnmatchedRequestContentType {
                request_spec_trail, ..
            }
            | Self::UnmatchedResponseContentType {
                request_spec_trail, ..
            } => request_spec_trail,
        }
    }
}

/// Which interaction, and which part of it, a diff is about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionTrail {
    pub pointer: Pointer,
    pub part: InteractionPart,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InteractionPart {
    RequestBody { content_type: Option<String> },
    ResponseStatus { status: u16 },
    ResponseBody { status: u16, content_type: Option<String> },
}

/// Where in the specification the interaction was compared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecTrail {
    pub method: String,
    /// Path template, e.g. `/pets/{petId}`
    pub path: String,
    pub status: Option<u16>,
}

/// Requests to an endpoint the specification does not document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndocumentedUrl {
    pub method: String,
    pub path: String,
    pub count: u64,
}
