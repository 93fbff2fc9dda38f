// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Ignored-request patterns.
//!
//! Each pattern is `[METHOD ]glob`: `OPTIONS *`, `GET /health`, `/static/**`.
//! The glob is matched against the normalized request path and `*` crosses
//! `/`.

use glob::Pattern;
use thiserror::Error;

use crate::api_spec::normalize_path;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Empty ignore pattern")]
    Empty,
}

#[derive(Clone, Debug)]
struct Rule {
    method: Option<String>,
    glob: Pattern,
}

/// Compiled set of ignore patterns. Empty ignores nothing.
#[derive(Clone, Debug, Default)]
pub struct RequestFilter {
    rules: Vec<Rule>,
}

impl RequestFilter {
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FilterError> {
        let rules = patterns
            .iter()
            .map(|p| parse_rule(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether a request should be skipped.
    pub fn ignores(&self, method: &str, path: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let path = normalize_path(path);
        self.rules.iter().any(|rule| {
            rule.method
                .as_deref()
                .is_none_or(|m| m.eq_ignore_ascii_case(method))
                && rule.glob.matches(&path)
        })
    }
}

fn parse_rule(pattern: &str) -> Result<Rule, FilterError> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return Err(FilterError::Empty);
    }
    let (method, glob) = match trimmed.split_once(char::is_whitespace) {
        Some((method, rest)) if method.chars().all(|c| c.is_ascii_alphabetic()) => {
            (Some(method.to_ascii_uppercase()), rest.trim())
        }
        _ => (None, trimmed),
    };
    let glob = Pattern::new(glob).map_err(|source| FilterError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(Rule { method, glob })
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
