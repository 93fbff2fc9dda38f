// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by tapdiff are defined here.
//! Use these accessors instead of calling `std::env::var()` directly.

/// Generated env var name constants.
mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

// Re-export name constants for callers that need the raw name string.
pub use names::*;

use std::path::PathBuf;

/// `TAPDIFF_CONFIG`: Project file override.
pub fn config_path() -> Option<PathBuf> {
    var_nonempty(names::TAPDIFF_CONFIG).map(PathBuf::from)
}

/// `TAPDIFF_CAPTURES_DIR`: Captures directory override.
pub fn captures_dir() -> Option<PathBuf> {
    var_nonempty(names::TAPDIFF_CAPTURES_DIR).map(PathBuf::from)
}

/// `TAPDIFF_LOG`, falling back to `RUST_LOG`: tracing filter directives.
pub fn log_filter() -> Option<String> {
    var_nonempty(names::TAPDIFF_LOG).or_else(|| var_nonempty(names::RUST_LOG))
}

/// `TAPDIFF_LOCK_STALE_MS`: Age after which a capture lock is reclaimed.
pub fn lock_stale_ms() -> Option<u64> {
    var_nonempty(names::TAPDIFF_LOCK_STALE_MS).and_then(|v| v.parse().ok())
}

fn var_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
