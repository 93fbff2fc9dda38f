// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use rstest::rstest;

const PETSTORE: &str = r#"{
  "endpoints": [
    { "method": "get", "path": "/pets",
      "responses": [ { "status": 200, "contentTypes": ["application/json"] } ] },
    { "method": "POST", "path": "/pets",
      "requestContentTypes": ["application/json"],
      "responses": [ { "status": 201 } ] },
    { "method": "GET", "path": "/pets/{petId}" },
    { "method": "GET", "path": "/pets/mine" }
  ]
}"#;

#[rstest]
#[case("/", "/")]
#[case("", "/")]
#[case("/pets/", "/pets")]
#[case("//pets///1", "/pets/1")]
#[case("/pets?limit=1", "/pets")]
#[case("/a/b#frag", "/a/b")]
fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize_path(input), expected);
}

#[rstest]
#[case("application/json", "application/json")]
#[case("Application/JSON; charset=utf-8", "application/json")]
#[case("", "")]
fn test_media_type(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(media_type(input), expected);
}

#[test]
fn test_find_matches_method_case_insensitively() {
    let spec = ApiSpec::from_json(PETSTORE).unwrap();
    assert_eq!(spec.len(), 4);
    assert_eq!(spec.find("GET", "/pets").unwrap().method, "get");
    assert!(spec.find("DELETE", "/pets").is_none());
}

#[test]
fn test_find_prefers_literal_segments() {
    let spec = ApiSpec::from_json(PETSTORE).unwrap();
    assert_eq!(spec.find("GET", "/pets/mine").unwrap().path, "/pets/mine");
    assert_eq!(spec.find("GET", "/pets/42").unwrap().path, "/pets/{petId}");
    assert!(spec.find("GET", "/pets/42/toys").is_none());
}

#[test]
fn test_literal_segments_are_escaped() {
    let spec = ApiSpec::from_json(
        r#"{"endpoints":[{"method":"GET","path":"/v1.0/items"}]}"#,
    )
    .unwrap();
    assert!(spec.find("GET", "/v1.0/items").is_some());
    assert!(spec.find("GET", "/v1x0/items").is_none());
}

#[rstest]
#[case::relative("pets")]
#[case::partial_param("/pets/id-{id}")]
#[case::empty_param("/pets/{}")]
fn test_invalid_templates_are_rejected(#[case] path: &str) {
    let json = format!(r#"{{"endpoints":[{{"method":"GET","path":"{path}"}}]}}"#);
    assert!(matches!(
        ApiSpec::from_json(&json).unwrap_err(),
        SpecError::InvalidPath { .. }
    ));
}

#[test]
fn test_content_type_acceptance() {
    let spec = ApiSpec::from_json(PETSTORE).unwrap();
    let create = spec.find("POST", "/pets").unwrap();
    assert!(create.accepts_request_content_type("application/json; charset=utf-8"));
    assert!(!create.accepts_request_content_type("text/plain"));

    let list = spec.find("GET", "/pets").unwrap();
    assert!(list.accepts_request_content_type("anything/at-all"));
    assert!(list.response(200).unwrap().accepts_content_type("application/json"));
    assert!(list.response(404).is_none());
}

#[test]
fn test_unknown_fields_are_rejected() {
    let err = ApiSpec::from_json(r#"{"endpoints":[],"paths":{}}"#).unwrap_err();
    assert!(matches!(err, SpecError::Json(_)));
}

#[test]
fn test_empty_spec_matches_nothing() {
    let spec = ApiSpec::empty();
    assert!(spec.is_empty());
    assert!(spec.find("GET", "/").is_none());
}
