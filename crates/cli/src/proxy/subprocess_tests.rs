// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;

fn addr() -> SocketAddr {
    "127.0.0.1:4321".parse().unwrap()
}

#[test]
fn test_proxy_env_values() {
    let vars = proxy_env(addr());
    assert_eq!(
        vars,
        [
            ("TAPDIFF_PROXY_HOST", "127.0.0.1".to_string()),
            ("TAPDIFF_PROXY_PORT", "4321".to_string()),
            ("TAPDIFF_PROXY", "http://127.0.0.1:4321".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_exit_code_is_passed_through() {
    let status = spawn(&CommandSpec::new("exit 7"), addr())
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(exit_code(status), 7);
}

#[cfg(unix)]
#[tokio::test]
async fn test_signal_maps_to_128_plus_signo() {
    let status = spawn(&CommandSpec::new("kill -9 $$"), addr())
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(exit_code(status), 137);
}

#[tokio::test]
async fn test_child_sees_proxy_env_without_touching_ours() {
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec::new("printf '%s %s' \"$TAPDIFF_PROXY\" \"$TAPDIFF_PROXY_PORT\" > seen")
        .with_cwd(dir.path());
    let status = spawn(&spec, addr()).unwrap().wait().await.unwrap();

    assert!(status.success());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("seen")).unwrap(),
        "http://127.0.0.1:4321 4321"
    );
    assert!(std::env::var("TAPDIFF_PROXY").is_err());
}

#[tokio::test]
async fn test_cwd_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec::new("touch marker").with_cwd(dir.path());
    let status = spawn(&spec, addr()).unwrap().wait().await.unwrap();

    assert!(status.success());
    assert!(dir.path().join("marker").exists());
}

#[test]
fn test_spawn_failure_names_command() {
    let err = ProxyError::Spawn {
        command: "make test".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "sh missing"),
    };
    assert_eq!(err.to_string(), "Failed to start command 'make test': sh missing");
}
