// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::env;

/// Filter used when neither `TAPDIFF_LOG` nor `RUST_LOG` is set.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "tapdiff=debug,tapdiff_capture=debug,tower_http=debug,warn"
    } else {
        "warn"
    }
}

/// Build the filter from the environment, falling back to the defaults.
///
/// Invalid directives in the environment are reported and ignored.
pub fn filter(verbose: bool) -> EnvFilter {
    match env::log_filter() {
        Some(directives) => EnvFilter::try_new(&directives).unwrap_or_else(|e| {
            crate::output::print_warning(format_args!("ignoring invalid log filter {directives:?}: {e}"));
            EnvFilter::new(default_directives(verbose))
        }),
        None => EnvFilter::new(default_directives(verbose)),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
