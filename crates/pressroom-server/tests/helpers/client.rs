//! In-process HTTP client over the router.

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Sends requests straight into a [`Router`] without binding a socket.
pub struct TestClient {
    app: Router,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self { app }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, &[]).await
    }

    /// POST sin body; the cache API reads everything from the query string.
    pub async fn post(&self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, &[]).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: Vec<(&str, &str)>) -> TestResponse {
        self.send(Method::GET, uri, &headers).await
    }

    async fn send(&self, method: Method, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        let request = headers
            .iter()
            .fold(Request::builder().method(method).uri(uri), |builder, (name, value)| {
                builder.header(*name, *value)
            })
            .body(Body::empty())
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body: body.collect().await.unwrap().to_bytes(),
        }
    }
}

/// Buffered response with assertion helpers that chain.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.text()))
    }

    /// `message` field of an error body.
    pub fn error_message(&self) -> String {
        let body: Value = self.json();
        body["message"].as_str().unwrap_or_default().to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "unexpected status, body: {}", self.text());
        self
    }

    pub fn assert_content_type_contains(&self, expected: &str) -> &Self {
        let content_type = self.header("content-type").unwrap_or_default();
        assert!(
            content_type.contains(expected),
            "content-type {content_type:?} does not contain {expected:?}"
        );
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(self.headers.contains_key(name), "missing header {name:?}");
        self
    }

    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(self.header(name), Some(expected), "header {name:?}");
        self
    }
}
