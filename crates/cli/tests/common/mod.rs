// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tapdiff_capture::{Body, CaptureStore, HttpRequest, HttpResponse, Interaction};

/// Documents `GET /a` only.
pub const SPEC_JSON: &str = r#"{
  "endpoints": [
    {
      "method": "GET",
      "path": "/a",
      "responses": [{ "status": 200, "contentTypes": ["application/json"] }]
    }
  ]
}"#;

pub fn get_a() -> Interaction {
    Interaction::new(
        "test",
        HttpRequest::new("GET", "/a").with_host("api.local"),
        HttpResponse::new(200).with_body(Body::new(
            Some("application/json".into()),
            br#"{"ok":true}"#.to_vec(),
        )),
    )
}

pub fn post_b() -> Interaction {
    Interaction::new(
        "test",
        HttpRequest::new("POST", "/b").with_host("api.local"),
        HttpResponse::new(201),
    )
}

/// `cap-1`: GET /a, POST /b, GET /a, then completed.
pub fn seed_cap_1(store: &CaptureStore) {
    let ledger = store.init("cap-1", None).unwrap();
    for interaction in [get_a(), post_b(), get_a()] {
        ledger.append(&interaction).unwrap();
    }
    ledger.finalize().unwrap();
}

/// Project directory with `tapdiff.toml`, `api.json` and `samples.json`.
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    pub fn new(tasks: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api.json"), SPEC_JSON).unwrap();
        std::fs::write(
            dir.path().join("samples.json"),
            serde_json::to_vec(&[get_a(), post_b(), get_a()]).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("tapdiff.toml"),
            format!(
                "name = \"fixture\"\nspecification = \"api.json\"\ncaptures_dir = \"captures\"\n\n{tasks}"
            ),
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> PathBuf {
        self.path().join("tapdiff.toml")
    }

    pub fn store(&self) -> CaptureStore {
        CaptureStore::new(self.path().join("captures"))
    }
}
