//! Error types for the request executor.
//!
//! # Design
//! `CallError` is what `RequestExecutor::call` returns. Transport failures
//! keep the method and url they happened on so the message points at the
//! originating request. `TransportError` carries a curl-compatible error
//! number, which is what ends up in `CallResult::curl_errno`.

use thiserror::Error;

use crate::http::HttpMethod;

/// Errors returned by `RequestExecutor::call` and the option layer.
#[derive(Debug, Error)]
pub enum CallError {
    /// The request url was empty or whitespace.
    #[error("request url must not be empty")]
    EmptyUrl,

    /// A transport option was out of range or conflicted with another one.
    #[error("invalid transport option: {0}")]
    InvalidOption(String),

    /// A structured request body could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// An options document could not be parsed.
    #[error("invalid options document: {0}")]
    Config(String),

    /// The request could not be completed.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: TransportError,
    },
}

impl CallError {
    /// Curl-compatible error number for transport failures.
    pub fn errno(&self) -> Option<u32> {
        match self {
            CallError::Transport { source, .. } => Some(source.errno()),
            _ => None,
        }
    }
}

/// Failure classes a transport can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    InvalidUrl,
    Proxy,
    HostNotFound,
    ConnectionFailed,
    Protocol,
    ReadFile,
    Timeout,
    Tls,
    TooManyRedirects,
    Receive,
    Decoding,
    BodyTooLarge,
    Other,
}

impl TransportErrorKind {
    /// The matching libcurl `CURLE_*` number.
    pub fn errno(&self) -> u32 {
        match self {
            TransportErrorKind::Other => 2,
            TransportErrorKind::InvalidUrl => 3,
            TransportErrorKind::Proxy => 5,
            TransportErrorKind::HostNotFound => 6,
            TransportErrorKind::ConnectionFailed => 7,
            TransportErrorKind::Protocol => 8,
            TransportErrorKind::ReadFile => 26,
            TransportErrorKind::Timeout => 28,
            TransportErrorKind::Tls => 35,
            TransportErrorKind::TooManyRedirects => 47,
            TransportErrorKind::Receive => 56,
            TransportErrorKind::Decoding => 61,
            TransportErrorKind::BodyTooLarge => 63,
        }
    }
}

/// A failed exchange, as reported by a `Transport`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn errno(&self) -> u32 {
        self.kind.errno()
    }
}
