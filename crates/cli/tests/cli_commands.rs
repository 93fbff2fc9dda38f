// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(deprecated)]

//! End-to-end tests of the `tapdiff` binary.

mod common;

use assert_cmd::Command;
use common::Project;
use predicates::prelude::*;

const TASKS: &str = r#"
[tasks.exit3]
command = "exit 3"

[tasks.quiet]
command = "true"
"#;

fn tapdiff(project: &Project) -> Command {
    let mut cmd = Command::cargo_bin("tapdiff").unwrap();
    cmd.current_dir(project.path())
        .env_remove("TAPDIFF_CONFIG")
        .env_remove("TAPDIFF_CAPTURES_DIR")
        .arg("--config")
        .arg(project.config());
    cmd
}

fn import(project: &Project, capture_id: &str) {
    tapdiff(project)
        .args(["import", "samples.json", "--capture-id", capture_id])
        .assert()
        .success()
        .stdout(format!("{capture_id}\n"));
}

#[test]
fn test_import_then_status() {
    let project = Project::new(TASKS);
    import(&project, "imported");

    tapdiff(&project)
        .args(["status", "imported"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Capture imported: 3 interactions"))
        .stdout(predicate::str::contains("Undocumented URLs:\n  POST /b (1)"));
}

#[test]
fn test_status_json() {
    let project = Project::new(TASKS);
    import(&project, "imported");

    let output = tapdiff(&project)
        .args(["status", "imported", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["captureId"], "imported");
    assert_eq!(report["stats"]["interactionsCount"], 3);
    assert_eq!(report["diffs"], serde_json::json!([]));
    assert_eq!(
        report["undocumentedUrls"],
        serde_json::json!([{ "method": "POST", "path": "/b", "count": 1 }])
    );
}

#[test]
fn test_status_ignore_flag() {
    let project = Project::new(TASKS);
    import(&project, "imported");

    tapdiff(&project)
        .args(["status", "imported", "--ignore", "POST /b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Traffic matches the specification"));
}

#[test]
fn test_status_unknown_capture() {
    let project = Project::new(TASKS);
    tapdiff(&project)
        .args(["status", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_run_passes_exit_code() {
    let project = Project::new(TASKS);
    tapdiff(&project)
        .args(["run", "exit3", "--pass-exit-code"])
        .assert()
        .code(3);

    tapdiff(&project).args(["run", "exit3"]).assert().success();
}

#[test]
fn test_run_ci_without_traffic_succeeds() {
    let project = Project::new(TASKS);
    tapdiff(&project)
        .args(["run", "quiet", "--ci"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Proxy listening on http://"));

    let captures = project.store().list().unwrap();
    assert_eq!(captures.len(), 1);
}

#[test]
fn test_run_on_busy_port_leaves_no_capture() {
    let project = Project::new(TASKS);
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = blocker.local_addr().unwrap().port();

    tapdiff(&project)
        .args(["run", "quiet", "--port", &port.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));

    assert!(project.store().list().unwrap().is_empty());
}

#[test]
fn test_run_unknown_task() {
    let project = Project::new(TASKS);
    tapdiff(&project)
        .args(["run", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}
