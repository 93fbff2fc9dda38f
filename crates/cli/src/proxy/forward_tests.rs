// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use rstest::rstest;
use std::net::SocketAddr;
use tower::ServiceExt;

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route(
            "/a",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/json"), (header::CONNECTION, "close")],
                    r#"{"ok":true}"#,
                )
            }),
        )
        .route(
            "/echo",
            post(|headers: HeaderMap, body: Bytes| async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .cloned()
                    .unwrap_or(HeaderValue::from_static("application/octet-stream"));
                ([(header::CONTENT_TYPE, content_type)], body)
            }),
        )
        .route(
            "/moved",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/a")]) }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn state_for(target: Option<Url>) -> (ForwardState, mpsc::Receiver<Interaction>) {
    let (tx, rx) = mpsc::channel(8);
    (ForwardState::new(client().unwrap(), target, tx), rx)
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[rstest]
#[case::root_target("/users/1?x=2", "http://api.local", "http://api.local/users/1?x=2")]
#[case::target_with_base("/users", "http://api.local/v1/", "http://api.local/v1/users")]
#[case::absolute_form("http://other.local:8080/p?q", "http://api.local", "http://other.local:8080/p?q")]
fn test_upstream_url(#[case] uri: &str, #[case] target: &str, #[case] expected: &str) {
    let uri: Uri = uri.parse().unwrap();
    let target = Url::parse(target).unwrap();
    assert_eq!(upstream_url(&uri, Some(&target)).unwrap().as_str(), expected);
}

#[test]
fn test_origin_form_without_target_is_an_error() {
    let uri: Uri = "/users".parse().unwrap();
    assert!(matches!(upstream_url(&uri, None), Err(ProxyError::InvalidUrl(_))));
}

#[test]
fn test_end_to_end_drops_transport_headers() {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-hop"));
    headers.insert("x-hop", HeaderValue::from_static("1"));
    headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
    headers.insert(header::HOST, HeaderValue::from_static("proxy.local"));
    headers.append("x-keep", HeaderValue::from_static("a"));
    headers.append("x-keep", HeaderValue::from_static("b"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

    let kept = end_to_end(&headers);
    let names: Vec<&str> = kept.keys().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["x-keep", "content-type"]);
    assert_eq!(kept.get_all("x-keep").iter().count(), 2);
}

#[tokio::test]
async fn test_reverse_proxy_returns_upstream_response_and_samples_it() {
    let upstream = spawn_upstream().await;
    let (state, mut samples) = state_for(Some(format!("http://{upstream}").parse().unwrap()));

    let response = router(state)
        .oneshot(Request::get("/a?verbose=1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert!(response.headers().get(header::CONNECTION).is_none());
    assert_eq!(body_text(response).await, r#"{"ok":true}"#);

    let sample = samples.recv().await.unwrap();
    assert_eq!(sample.source, SOURCE);
    assert_eq!(sample.request.method, "GET");
    assert_eq!(sample.request.path, "/a");
    assert_eq!(sample.request.query.as_deref(), Some("verbose=1"));
    assert_eq!(sample.response.status, 200);
    assert_eq!(sample.response.body.content_type.as_deref(), Some("application/json"));
    assert_eq!(sample.response.body.bytes, br#"{"ok":true}"#);
    assert!(sample.started_at <= sample.completed_at);
}

#[tokio::test]
async fn test_request_body_and_content_type_are_captured() {
    let upstream = spawn_upstream().await;
    let (state, mut samples) = state_for(Some(format!("http://{upstream}").parse().unwrap()));

    let response = router(state)
        .oneshot(
            Request::post("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_text(response).await, r#"{"name":"x"}"#);

    let sample = samples.recv().await.unwrap();
    assert_eq!(sample.request.body.content_type.as_deref(), Some("application/json"));
    assert_eq!(sample.request.body.bytes, br#"{"name":"x"}"#);
    assert_eq!(sample.response.body.bytes, br#"{"name":"x"}"#);
}

#[tokio::test]
async fn test_absolute_form_goes_where_it_points() {
    let upstream = spawn_upstream().await;
    let (state, mut samples) = state_for(None);

    let response = router(state)
        .oneshot(
            Request::get(format!("http://{upstream}/a"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sample = samples.recv().await.unwrap();
    assert_eq!(sample.request.host, upstream.to_string());
    assert_eq!(sample.request.path, "/a");
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let upstream = spawn_upstream().await;
    let (state, mut samples) = state_for(Some(format!("http://{upstream}").parse().unwrap()));

    let response = router(state)
        .oneshot(Request::get("/moved").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(samples.recv().await.unwrap().response.status, 302);
}

#[tokio::test]
async fn test_upstream_failure_is_502_without_sample() {
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (state, mut samples) = state_for(Some(format!("http://{closed}").parse().unwrap()));

    let response = router(state)
        .oneshot(Request::get("/a").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(samples.try_recv().is_err());
}

#[tokio::test]
async fn test_connect_is_not_implemented() {
    let (state, mut samples) = state_for(None);
    let response = router(state)
        .oneshot(
            Request::builder()
                .method(Method::CONNECT)
                .uri("api.local:443")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert!(samples.try_recv().is_err());
}

#[rstest]
#[case::head(Method::HEAD, StatusCode::OK, Some("11"))]
#[case::not_modified(Method::GET, StatusCode::NOT_MODIFIED, Some("11"))]
#[case::plain_get(Method::GET, StatusCode::OK, None)]
fn test_declared_length(
    #[case] method: Method,
    #[case] status: StatusCode,
    #[case] expected: Option<&str>,
) {
    let mut upstream = HeaderMap::new();
    upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("11"));
    let length = declared_length(&method, status, &upstream);
    assert_eq!(length.as_ref().map(|v| v.to_str().unwrap()), expected);
    assert_eq!(declared_length(&method, status, &HeaderMap::new()), None);
}

#[tokio::test]
async fn test_head_keeps_upstream_content_length() {
    let upstream = spawn_upstream().await;
    let (state, mut samples) = state_for(Some(format!("http://{upstream}").parse().unwrap()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let length = |response: &reqwest::Response| {
        response
            .headers()
            .get(header::CONTENT_LENGTH)
            .map(|v| v.to_str().unwrap().to_string())
    };
    let direct = client.head(format!("http://{upstream}/a")).send().await.unwrap();
    let proxied = client.head(format!("http://{proxy}/a")).send().await.unwrap();

    assert_eq!(proxied.status(), StatusCode::OK);
    assert_eq!(length(&direct).as_deref(), Some("11"));
    assert_eq!(length(&proxied), length(&direct));

    let sample = samples.recv().await.unwrap();
    assert_eq!(sample.request.method, "HEAD");
    assert!(sample.response.body.bytes.is_empty());
}
