// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use proptest::prelude::*;

fn sample() -> Interaction {
    let request = HttpRequest::new("POST", "/users")
        .with_host("api.example.com")
        .with_query(Some("expand=true".to_string()))
        .with_header("Content-Type", "application/json")
        .with_body(Body::new(
            Some("application/json".to_string()),
            br#"{"name":"ada"}"#.to_vec(),
        ));
    let response = HttpResponse::new(201)
        .with_header("Content-Type", "application/json")
        .with_body(Body::new(
            Some("application/json".to_string()),
            br#"{"id":1}"#.to_vec(),
        ));
    Interaction::new("proxy", request, response)
}

#[test]
fn test_interaction_serialization_uses_camel_case() {
    let json = serde_json::to_value(sample()).unwrap();

    assert!(json.get("startedAt").is_some());
    assert!(json.get("completedAt").is_some());
    assert_eq!(json["request"]["body"]["contentType"], "application/json");
}

#[test]
fn test_body_is_stored_as_base64() {
    let body = Body::new(None, vec![0u8, 159, 146, 150]);
    let json = serde_json::to_value(&body).unwrap();

    assert_eq!(json["base64"], "AJ+Slg==");
    let parsed: Body = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.bytes, vec![0u8, 159, 146, 150]);
}

#[test]
fn test_invalid_base64_is_rejected() {
    let result: Result<Body, _> =
        serde_json::from_str(r#"{"contentType":null,"base64":"not base64!"}"#);
    assert!(result.is_err());
}

#[test]
fn test_new_interactions_get_distinct_ids() {
    let a = sample();
    let b = sample();
    assert_ne!(a.uuid, b.uuid);
}

proptest! {
    #[test]
    fn prop_interaction_roundtrip(
        method in "(GET|POST|PUT|DELETE)",
        path in "/[a-z0-9/]{0,24}",
        status in 100u16..600,
        request_bytes in proptest::collection::vec(any::<u8>(), 0..64),
        response_bytes in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let request = HttpRequest::new(method, path)
            .with_body(Body::new(None, request_bytes));
        let response = HttpResponse::new(status)
            .with_body(Body::new(Some("application/octet-stream".to_string()), response_bytes));
        let interaction = Interaction::new("proptest", request, response);

        let json = serde_json::to_string(&interaction).unwrap();
        let parsed: Interaction = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, interaction);
    }
}
