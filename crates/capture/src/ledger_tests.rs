// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::interaction::{HttpRequest, HttpResponse};
use serde_json::json;

fn sample(path: &str) -> Interaction {
    Interaction::new(
        "proxy",
        HttpRequest::new("GET", path),
        HttpResponse::new(200),
    )
}

#[test]
fn test_append_finalize_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();

    let p1 = ledger.append(&sample("/a")).unwrap();
    let p2 = ledger.append(&sample("/b")).unwrap();
    let p3 = ledger.append(&sample("/c")).unwrap();
    assert!(p1 < p2 && p2 < p3);

    assert_eq!(ledger.finalize().unwrap(), FinalizeOutcome::Finalized);

    let state = ledger.load_status().unwrap();
    assert_eq!(state.status, CaptureStatus::Completed);
    assert_eq!(state.metadata.last_interaction, Some(p3.clone()));
    assert_eq!(ledger.load_summary().unwrap().interactions_count, 3);

    let paths: Vec<String> = ledger
        .entries_after(None)
        .map(|entry| entry.unwrap().interaction.request.path)
        .collect();
    assert_eq!(paths, vec!["/a", "/b", "/c"]);

    let after_first: Vec<Pointer> = ledger
        .entries_after(Some(&p1))
        .map(|entry| entry.unwrap().pointer)
        .collect();
    assert_eq!(after_first, vec![p2, p3]);
}

#[test]
fn test_append_after_finalize_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    ledger.finalize().unwrap();

    let err = ledger.append(&sample("/late")).unwrap_err();
    assert!(matches!(err, LedgerError::CaptureCompleted(_)));
    assert_eq!(ledger.load_summary().unwrap().interactions_count, 0);
    assert_eq!(ledger.entries_after(None).count(), 0);
}

#[test]
fn test_finalize_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();

    assert_eq!(ledger.finalize().unwrap(), FinalizeOutcome::Finalized);
    assert_eq!(ledger.finalize().unwrap(), FinalizeOutcome::AlreadyCompleted);
}

#[test]
fn test_racing_finalizers_complete_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    CaptureLedger::init(dir.path(), "cap-1", None).unwrap();

    let outcomes: Vec<FinalizeOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let base = dir.path();
                scope.spawn(move || {
                    CaptureLedger::open(base, "cap-1")
                        .unwrap()
                        .finalize()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let finalized = outcomes
        .iter()
        .filter(|o| **o == FinalizeOutcome::Finalized)
        .count();
    assert_eq!(finalized, 1);
}

#[test]
fn test_concurrent_appends_are_all_counted() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    let other = CaptureLedger::open(dir.path(), "cap-1").unwrap();

    std::thread::scope(|scope| {
        for (i, handle) in [&ledger, &other, &ledger, &other].into_iter().enumerate() {
            scope.spawn(move || {
                for j in 0..10 {
                    handle.append(&sample(&format!("/{i}/{j}"))).unwrap();
                }
            });
        }
    });

    assert_eq!(ledger.load_summary().unwrap().interactions_count, 40);
    let pointers: Vec<Pointer> = ledger
        .entries_after(None)
        .map(|entry| entry.unwrap().pointer)
        .collect();
    assert_eq!(pointers.len(), 40);
    assert!(pointers.windows(2).all(|w| w[0] < w[1]));

    let last = ledger.load_status().unwrap().metadata.last_interaction;
    assert!(last.is_some());
}

#[test]
fn test_started_at_comes_from_the_clock() {
    let dir = tempfile::tempdir().unwrap();
    let clock = crate::clock::FakeClock::new(1_800_000_000_000);
    let options = LedgerOptions::default().with_clock(Arc::new(clock));
    let ledger = CaptureLedger::init_with(dir.path(), "cap-1", None, options).unwrap();

    let started_at = ledger.load_status().unwrap().metadata.started_at;
    assert_eq!(started_at.timestamp_millis(), 1_800_000_000_000);
}

#[test]
fn test_open_never_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    let interactions = ledger.interactions_dir();
    std::fs::remove_dir(&interactions).unwrap();

    let reopened = CaptureLedger::open(dir.path(), "cap-1").unwrap();
    assert!(!interactions.exists());
    assert_eq!(reopened.entries_after(None).count(), 0);

    assert!(CaptureLedger::open(dir.path(), "cap-2").unwrap_err().is_not_found());
    assert!(!dir.path().join("cap-2").exists());
}

#[test]
fn test_corrupt_entry_is_reported_and_scan_continues() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    ledger.append(&sample("/a")).unwrap();
    let bad = ledger.append(&sample("/b")).unwrap();
    ledger.append(&sample("/c")).unwrap();

    std::fs::write(
        ledger.interactions_dir().join(format!("{bad}.json")),
        b"{\"uuid\":",
    )
    .unwrap();

    let mut entries = ledger.entries_after(None);
    assert_eq!(entries.len(), 3);
    assert!(entries.current().is_none());

    assert!(entries.next().unwrap().is_ok());
    let err = entries.next().unwrap().unwrap_err();
    assert!(err.is_per_item());
    assert_eq!(entries.current(), Some(&bad));
    assert_eq!(
        entries.next().unwrap().unwrap().interaction.request.path,
        "/c"
    );
    assert!(entries.next().is_none());
}

#[test]
fn test_reinit_reconciles_interaction_count() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
        ledger.append(&sample("/a")).unwrap();
        ledger.append(&sample("/b")).unwrap();
        // Simulate a crash between envelope write and counter update.
        write_json_atomic(
            &ledger.paths.summary_path(),
            &CaptureSummary {
                diffs_count: 0,
                interactions_count: 1,
            },
        )
        .unwrap();
    }

    let reader = CaptureLedger::open(dir.path(), "cap-1").unwrap();
    assert_eq!(reader.load_summary().unwrap().interactions_count, 1);

    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    assert_eq!(ledger.load_summary().unwrap().interactions_count, 2);
}

#[test]
fn test_reinit_with_same_config_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = Some(json!({"command": "npm start"}));
    let first = CaptureLedger::init(dir.path(), "cap-1", config.clone()).unwrap();
    let p = first.append(&sample("/a")).unwrap();

    let second = CaptureLedger::init(dir.path(), "cap-1", config).unwrap();
    let state = second.load_status().unwrap();
    assert_eq!(state.status, CaptureStatus::Started);
    assert_eq!(state.metadata.last_interaction, Some(p));
}

#[test]
fn test_reinit_with_different_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    CaptureLedger::init(dir.path(), "cap-1", Some(json!({"command": "a"}))).unwrap();

    let err = CaptureLedger::init(dir.path(), "cap-1", Some(json!({"command": "b"})))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        LedgerError::AlreadyInitializedWithDifferentConfig { .. }
    ));
}

#[test]
fn test_open_missing_capture_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = CaptureLedger::open(dir.path(), "nope").err().unwrap();
    assert!(err.is_not_found());
}

#[test]
fn test_add_diffs_accumulates() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    ledger.add_diffs(2).unwrap();
    ledger.add_diffs(0).unwrap();
    ledger.add_diffs(3).unwrap();
    assert_eq!(ledger.load_summary().unwrap().diffs_count, 5);
}

#[test]
fn test_state_file_uses_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = CaptureLedger::init(dir.path(), "cap-1", None).unwrap();
    ledger.append(&sample("/a")).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(ledger.paths.state_path()).unwrap()).unwrap();
    assert_eq!(raw["captureId"], "cap-1");
    assert_eq!(raw["status"], "started");
    assert!(raw["metadata"]["startedAt"].is_string());
    assert_eq!(
        raw["metadata"]["lastInteraction"],
        "00000000000000000000"
    );
}

#[test]
fn test_lock_timeout_surfaces_from_append() {
    use crate::clock::FakeClock;
    use crate::lock::AdvisoryLock;

    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_800_000_000_000);
    let options = LedgerOptions::default()
        .with_clock(Arc::new(clock.clone()))
        .with_lock_policy(
            LockPolicy::default()
                .with_stale_after(std::time::Duration::from_secs(600))
                .with_timeout(std::time::Duration::from_secs(1)),
        );
    let ledger = CaptureLedger::init_with(dir.path(), "cap-1", None, options).unwrap();

    let holder = FileLock::new(
        ledger.paths.lock_path(),
        Arc::new(clock.without_auto_advance()),
        std::time::Duration::from_secs(600),
    );
    assert!(holder.try_lock().unwrap());

    let err = ledger.append(&sample("/a")).unwrap_err();
    assert!(matches!(err, LedgerError::LockTimeout { .. }));
    assert_eq!(ledger.entries_after(None).count(), 0);
}
