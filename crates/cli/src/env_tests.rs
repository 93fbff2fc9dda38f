// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn config_path_returns_none_when_unset() {
    std::env::remove_var(TAPDIFF_CONFIG);
    assert_eq!(config_path(), None);
}

#[test]
#[serial]
fn config_path_returns_path_when_set() {
    std::env::set_var(TAPDIFF_CONFIG, "/tmp/tapdiff.toml");
    let result = config_path();
    std::env::remove_var(TAPDIFF_CONFIG);
    assert_eq!(result, Some(PathBuf::from("/tmp/tapdiff.toml")));
}

#[test]
#[serial]
fn captures_dir_ignores_empty_value() {
    std::env::set_var(TAPDIFF_CAPTURES_DIR, "");
    let result = captures_dir();
    std::env::remove_var(TAPDIFF_CAPTURES_DIR);
    assert_eq!(result, None);
}

#[test]
#[serial]
fn log_filter_prefers_tapdiff_log() {
    std::env::set_var(TAPDIFF_LOG, "tapdiff=debug");
    std::env::set_var(RUST_LOG, "info");
    let result = log_filter();
    std::env::remove_var(TAPDIFF_LOG);
    std::env::remove_var(RUST_LOG);
    assert_eq!(result.as_deref(), Some("tapdiff=debug"));
}

#[test]
#[serial]
fn log_filter_falls_back_to_rust_log() {
    std::env::remove_var(TAPDIFF_LOG);
    std::env::set_var(RUST_LOG, "info");
    let result = log_filter();
    std::env::remove_var(RUST_LOG);
    assert_eq!(result.as_deref(), Some("info"));
}

#[test]
#[serial]
fn lock_stale_ms_parses_valid_u64() {
    std::env::set_var(TAPDIFF_LOCK_STALE_MS, "2500");
    let result = lock_stale_ms();
    std::env::remove_var(TAPDIFF_LOCK_STALE_MS);
    assert_eq!(result, Some(2500));
}

#[test]
#[serial]
fn lock_stale_ms_returns_none_for_non_numeric() {
    std::env::set_var(TAPDIFF_LOCK_STALE_MS, "soon");
    let result = lock_stale_ms();
    std::env::remove_var(TAPDIFF_LOCK_STALE_MS);
    assert_eq!(result, None);
}
