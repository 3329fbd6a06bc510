//! Local HTTP server the relay integration tests run against.
//!
//! `/echo` reflects the method, headers and body it received as JSON; the
//! other routes produce specific statuses, headers, redirects and delays.

use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Echo {
    /// First value of `name`. Header names arrive lower-cased.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/headers", get(with_headers))
        .route("/redirect", any(redirect))
        .route("/slow/{millis}", get(slow))
        .route("/bytes/{len}", get(bytes))
        .route("/binary", get(binary))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn with_headers() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::HeaderName::from_static("x-relay-test"), "yes"),
        ],
        "with headers",
    )
}

async fn redirect() -> Redirect {
    Redirect::to("/echo")
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "slow"
}

/// `len` ASCII `a`s.
async fn bytes(Path(len): Path<usize>) -> String {
    "a".repeat(len)
}

async fn binary() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![0xffu8, 0xfe, b'o', b'k'],
    )
}
