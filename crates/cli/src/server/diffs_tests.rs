// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use serde_json::json;
use tapdiff_capture::Pointer;

#[test]
fn test_progress_goes_out_as_message() {
    let event = ProgressEvent::Progress {
        pointer: Pointer::from_seq(2),
        interactions_count: 3,
        diffs_count: 1,
        undocumented_urls_count: 0,
    };
    assert_eq!(
        notification(&event),
        json!({
            "type": "message",
            "data": {
                "pointer": "00000000000000000002",
                "interactionsCount": 3,
                "diffsCount": 1,
                "undocumentedUrlsCount": 0
            }
        })
    );
}

#[test]
fn test_other_events_keep_their_type() {
    let error = ProgressEvent::Error {
        pointer: None,
        message: "boom".into(),
    };
    assert_eq!(notification(&error)["type"], "error");

    let completed = ProgressEvent::Completed(DiffStats {
        completed: true,
        ..DiffStats::default()
    });
    let value = notification(&completed);
    assert_eq!(value["type"], "completed");
    assert_eq!(value["data"]["completed"], true);
}

#[test]
fn test_start_request_fields_are_optional() {
    let request: StartDiffRequest = serde_json::from_str("{}").unwrap();
    assert!(request.filters.is_empty());
    assert!(request.ignore_requests.is_empty());

    let request: StartDiffRequest =
        serde_json::from_str(r#"{"ignoreRequests": ["OPTIONS *"]}"#).unwrap();
    assert_eq!(request.ignore_requests, vec!["OPTIONS *"]);
}
