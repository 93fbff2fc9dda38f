// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Build scripts are expected to panic on failure.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::Write;

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let path = std::path::Path::new(&out_dir).join("env_names.rs");
    let mut f = std::fs::File::create(path).unwrap();

    let vars = [
        ("TAPDIFF_CONFIG", "TAPDIFF_CONFIG"),
        ("TAPDIFF_CAPTURES_DIR", "TAPDIFF_CAPTURES_DIR"),
        ("TAPDIFF_LOG", "TAPDIFF_LOG"),
        ("TAPDIFF_LOCK_STALE_MS", "TAPDIFF_LOCK_STALE_MS"),
        ("TAPDIFF_PROXY_HOST", "TAPDIFF_PROXY_HOST"),
        ("TAPDIFF_PROXY_PORT", "TAPDIFF_PROXY_PORT"),
        ("TAPDIFF_PROXY", "TAPDIFF_PROXY"),
        ("RUST_LOG", "RUST_LOG"),
    ];

    for (const_name, env_name) in vars {
        writeln!(f, "pub const {const_name}: &str = \"{env_name}\";").unwrap();
    }
}
