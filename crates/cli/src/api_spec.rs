// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint-level API specification and request matching.
//!
//! ```json
//! { "endpoints": [
//!     { "method": "GET", "path": "/users/{id}",
//!       "requestContentTypes": [],
//!       "responses": [ { "status": 200, "contentTypes": ["application/json"] } ] }
//! ] }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Failed to read specification: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse specification: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path template '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiSpecDocument {
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndpointSpec {
    pub method: String,
    pub path: String,

    /// Accepted request body media types. Empty accepts anything.
    #[serde(default)]
    pub request_content_types: Vec<String>,

    /// Documented responses. Empty accepts any status.
    #[serde(default)]
    pub responses: Vec<ResponseSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseSpec {
    pub status: u16,

    #[serde(default)]
    pub content_types: Vec<String>,
}

impl EndpointSpec {
    pub fn response(&self, status: u16) -> Option<&ResponseSpec> {
        self.responses.iter().find(|r| r.status == status)
    }

    pub fn accepts_request_content_type(&self, content_type: &str) -> bool {
        accepts(&self.request_content_types, content_type)
    }
}

impl ResponseSpec {
    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        accepts(&self.content_types, content_type)
    }
}

fn accepts(documented: &[String], content_type: &str) -> bool {
    documented.is_empty()
        || documented
            .iter()
            .any(|d| media_type(d) == media_type(content_type))
}

/// `Application/JSON; charset=utf-8` -> `application/json`
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

struct CompiledEndpoint {
    method: String,
    matcher: Regex,
    params: usize,
    spec: EndpointSpec,
}

/// Specification compiled for matching.
pub struct ApiSpec {
    endpoints: Vec<CompiledEndpoint>,
}

impl std::fmt::Debug for ApiSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSpec")
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}

impl ApiSpec {
    /// A specification that documents nothing.
    pub fn empty() -> Self {
        Self {
            endpoints: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Self::compile(serde_json::from_str(json)?)
    }

    pub fn compile(document: ApiSpecDocument) -> Result<Self, SpecError> {
        let endpoints = document
            .endpoints
            .into_iter()
            .map(|spec| {
                let (matcher, params) = compile_template(&spec.path)?;
                Ok(CompiledEndpoint {
                    method: spec.method.to_ascii_uppercase(),
                    matcher,
                    params,
                    spec,
                })
            })
            .collect::<Result<Vec<_>, SpecError>>()?;
        Ok(Self { endpoints })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoint documenting `method` on a normalized `path`.
    ///
    /// When several templates match, the one with the fewest parameters wins,
    /// so `/users/me` beats `/users/{id}`.
    pub fn find(&self, method: &str, path: &str) -> Option<&EndpointSpec> {
        self.endpoints
            .iter()
            .filter(|e| e.method.eq_ignore_ascii_case(method) && e.matcher.is_match(path))
            .min_by_key(|e| e.params)
            .map(|e| &e.spec)
    }
}

fn compile_template(path: &str) -> Result<(Regex, usize), SpecError> {
    let invalid = |reason: &str| SpecError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let mut pattern = String::from("^");
    let mut params = 0;
    for segment in normalize_path(path).split('/').skip(1) {
        pattern.push('/');
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() || name.contains(['{', '}']) {
                return Err(invalid("malformed parameter"));
            }
            pattern.push_str("[^/]+");
            params += 1;
        } else if segment.contains(['{', '}']) {
            return Err(invalid("parameters must span a whole segment"));
        } else {
            pattern.push_str(&regex::escape(segment));
        }
    }
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
    Ok((regex, params))
}

/// Canonical form of a request path for matching and grouping.
///
/// Drops any query string, collapses repeated slashes and trims a trailing
/// slash. The root path stays `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
#[path = "api_spec_tests.rs"]
mod tests;
