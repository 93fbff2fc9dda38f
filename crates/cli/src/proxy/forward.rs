// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request forwarding and sample capture.
//!
//! Origin-form requests (`GET /users`) are sent to the configured target.
//! Absolute-form requests (`GET http://api.local/users`) are sent where they
//! point, which lets the proxy double as an `HTTP_PROXY`. Responses are
//! returned byte for byte, minus hop-by-hop headers.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::Utc;
use reqwest::Url;
use tapdiff_capture::{Body as CapturedBody, Header, HttpRequest, HttpResponse, Interaction};
use tokio::sync::mpsc;

use super::ProxyError;

/// Value of [`Interaction::source`] for proxied samples.
pub const SOURCE: &str = "proxy";

/// Largest request body the proxy will buffer.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Clone)]
pub struct ForwardState {
    client: reqwest::Client,
    target: Option<Url>,
    samples: mpsc::Sender<Interaction>,
    body_limit: usize,
}

impl ForwardState {
    pub fn new(
        client: reqwest::Client,
        target: Option<Url>,
        samples: mpsc::Sender<Interaction>,
    ) -> Self {
        Self {
            client,
            target,
            samples,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

/// Upstream client: no redirects, no decompression, no ambient proxies.
pub fn client() -> Result<reqwest::Client, ProxyError> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()?)
}

/// Every path and method goes to [`forward`].
pub fn router(state: ForwardState) -> Router {
    Router::new().fallback(forward).with_state(state)
}

async fn forward(State(state): State<ForwardState>, request: Request) -> Response {
    if request.method() == Method::CONNECT {
        return (StatusCode::NOT_IMPLEMENTED, "CONNECT tunnelling is not supported").into_response();
    }
    let method = request.method().clone();
    let uri = request.uri().clone();

    match proxy(&state, request).await {
        Ok(response) => response,
        Err(ProxyError::RequestBody(e)) => {
            tracing::warn!(%method, %uri, error = %e, "failed to read request body");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::warn!(%method, %uri, error = %e, "upstream request failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

async fn proxy(state: &ForwardState, request: Request) -> Result<Response, ProxyError> {
    let started_at = Utc::now();
    let (parts, body) = request.into_parts();
    let url = upstream_url(&parts.uri, state.target.as_ref())?;
    let request_bytes = axum::body::to_bytes(body, state.body_limit)
        .await
        .map_err(ProxyError::RequestBody)?;

    let upstream = state
        .client
        .request(parts.method.clone(), url.clone())
        .headers(end_to_end(&parts.headers))
        .body(request_bytes.clone())
        .send()
        .await?;
    let status = upstream.status();
    let response_headers = upstream.headers().clone();
    let response_bytes = upstream.bytes().await?;
    let completed_at = Utc::now();

    tracing::debug!(method = %parts.method, %url, status = status.as_u16(), "proxied");

    let host = match parts.uri.authority() {
        Some(authority) => authority.to_string(),
        None => parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| url.authority().to_string()),
    };
    let sample = Interaction::new(
        SOURCE,
        HttpRequest {
            method: parts.method.to_string(),
            host,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(String::from),
            headers: captured_headers(&parts.headers),
            body: captured_body(&parts.headers, &request_bytes),
        },
        HttpResponse {
            status: status.as_u16(),
            headers: captured_headers(&response_headers),
            body: captured_body(&response_headers, &response_bytes),
        },
    )
    .with_timing(started_at, completed_at);

    // Queued before the reply goes out.
    if state.samples.send(sample).await.is_err() {
        tracing::warn!("sample consumer is gone, dropping sample");
    }

    let mut headers = end_to_end(&response_headers);
    if let Some(length) = declared_length(&parts.method, status, &response_headers) {
        headers.insert(header::CONTENT_LENGTH, length);
    }
    let mut response = Response::new(Body::from(response_bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Upstream `Content-Length` for responses that carry no body on the wire.
///
/// HEAD and 304 replies describe a representation they do not include, so
/// the length cannot be recomputed from the (empty) body we pass on.
pub fn declared_length(
    method: &Method,
    status: StatusCode,
    upstream: &HeaderMap,
) -> Option<HeaderValue> {
    if *method != Method::HEAD && status != StatusCode::NOT_MODIFIED {
        return None;
    }
    upstream.get(header::CONTENT_LENGTH).cloned()
}

/// Where a request should go upstream.
pub fn upstream_url(uri: &Uri, target: Option<&Url>) -> Result<Url, ProxyError> {
    if uri.scheme().is_some() {
        return Url::parse(&uri.to_string()).map_err(|e| ProxyError::InvalidUrl(format!("{uri}: {e}")));
    }
    let Some(target) = target else {
        return Err(ProxyError::InvalidUrl(format!(
            "{uri}: origin-form request but no target is configured"
        )));
    };

    let mut url = target.clone();
    let base = target.path().trim_end_matches('/');
    url.set_path(&format!("{base}{}", uri.path()));
    url.set_query(uri.query());
    Ok(url)
}

/// Whether a header only concerns a single transport hop.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Headers safe to pass on, in original order.
///
/// Drops hop-by-hop headers, anything the `Connection` header names, and
/// the framing headers the next hop recomputes.
pub fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let named: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name)
            || name == header::CONTENT_LENGTH
            || name == header::HOST
            || named.iter().any(|n| n == name.as_str())
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn captured_headers(headers: &HeaderMap) -> Vec<Header> {
    headers
        .iter()
        .map(|(name, value)| Header {
            name: name.to_string(),
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        })
        .collect()
}

fn captured_body(headers: &HeaderMap, bytes: &Bytes) -> CapturedBody {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    CapturedBody::new(content_type, bytes.to_vec())
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
