//! HTTP request/response types passed between the executor and a transport.
//!
//! # Design
//! `prepare` turns a method, url and `CallOptions` into a `PreparedRequest`
//! without touching the network. A `Transport` then performs the I/O and
//! hands back a `RawResponse`. Keeping the request as plain data makes the
//! option mapping testable without a server.

use std::fmt;
use std::path::PathBuf;

use crate::options::TransportSettings;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Resolve a method name. Unrecognized names fall back to `Get`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("POST") {
            HttpMethod::Post
        } else if name.eq_ignore_ascii_case("PUT") {
            HttpMethod::Put
        } else if name.eq_ignore_ascii_case("PATCH") {
            HttpMethod::Patch
        } else if name.eq_ignore_ascii_case("DELETE") {
            HttpMethod::Delete
        } else {
            HttpMethod::Get
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(name: &str) -> Self {
        HttpMethod::from_name(name)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets sent as the request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    /// Streamed from disk (PUT-from-file).
    File(PathBuf),
}

/// A fully resolved request, ready for a `Transport`.
///
/// `headers` is the final outgoing list in send order. When
/// `include_headers` is set the transport must prefix the body of the
/// `RawResponse` with the response header block.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub payload: Payload,
    pub include_headers: bool,
    pub settings: TransportSettings,
}

impl PreparedRequest {
    /// First value of `name`, compared ASCII case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What a transport returns for a completed exchange.
///
/// `status` is `None` when the transport could not determine a status code.
/// `text` holds `<status line>\r\n<headers>\r\n\r\n<body>` when the request
/// asked for headers, and just the body otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: Option<u16>,
    pub text: String,
}
