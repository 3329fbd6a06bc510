//! Executing a `PreparedRequest` over the network.
//!
//! # Design
//! `Transport` is the I/O seam: the executor never talks to `ureq` directly,
//! so tests can substitute a recording transport. `UreqTransport` builds a
//! fresh agent for every request from the resolved `TransportSettings`;
//! the agent and any open file are dropped when `execute` returns, on the
//! error path as well.

use std::fs::File;
use std::io;

use tracing::debug;
use ureq::http;
use ureq::tls::TlsConfig;
use ureq::{Agent, Body, Proxy};

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{Payload, PreparedRequest, RawResponse};
use crate::options::TransportSettings;

/// Performs one HTTP exchange.
pub trait Transport {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Non-2xx statuses are returned as data, never as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    fn agent(settings: &TransportSettings) -> Result<Agent, TransportError> {
        let proxy = settings
            .proxy
            .as_deref()
            .map(Proxy::new)
            .transpose()
            .map_err(|e| TransportError::new(TransportErrorKind::Proxy, e.to_string()))?;

        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(settings.timeout))
            .timeout_connect(settings.connect_timeout)
            .max_redirects(settings.max_redirects)
            .max_redirects_will_error(settings.max_redirects > 0)
            .proxy(proxy)
            .tls_config(
                TlsConfig::builder()
                    .disable_verification(!settings.verify_tls)
                    .build(),
            )
            .build();
        Ok(config.new_agent())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let agent = Self::agent(&request.settings)?;

        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            "dispatching request"
        );

        let result = match &request.payload {
            Payload::Empty => agent.run(builder.body(()).map_err(invalid_request)?),
            Payload::Text(text) => agent.run(builder.body(text.as_bytes()).map_err(invalid_request)?),
            Payload::File(path) => {
                let file = File::open(path).map_err(|e| {
                    TransportError::new(
                        TransportErrorKind::ReadFile,
                        format!("cannot open {}: {e}", path.display()),
                    )
                })?;
                agent.run(builder.body(file).map_err(invalid_request)?)
            }
        };
        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let mut text = if request.include_headers {
            header_block(&response)
        } else {
            String::new()
        };
        let limit = request.settings.max_body_bytes.unwrap_or(u64::MAX);
        let bytes = response
            .body_mut()
            .with_config()
            .limit(limit)
            .read_to_vec()
            .map_err(classify)?;
        text.push_str(&String::from_utf8_lossy(&bytes));

        debug!(status, bytes = bytes.len(), "response received");
        Ok(RawResponse {
            status: Some(status),
            text,
        })
    }
}

/// `<version> <code> <reason>\r\n<Name>: <value>\r\n...\r\n\r\n`
///
/// `ureq` parses the head before handing it over, so the block is rebuilt:
/// the reason phrase is the canonical one for the code (omitted when the code
/// has none) and header names are title-cased from their lower-case form.
fn header_block(response: &http::Response<Body>) -> String {
    let status = response.status();
    let mut block = format!("{:?} {}", response.version(), status.as_u16());
    if let Some(reason) = status.canonical_reason() {
        block.push(' ');
        block.push_str(reason);
    }
    for (name, value) in response.headers() {
        block.push_str("\r\n");
        block.push_str(&title_case(name.as_str()));
        block.push_str(": ");
        block.push_str(&String::from_utf8_lossy(value.as_bytes()));
    }
    block.push_str("\r\n\r\n");
    block
}

/// `x-request-id` -> `X-Request-Id`
fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn invalid_request(err: http::Error) -> TransportError {
    let kind = if err.is::<http::header::InvalidHeaderName>()
        || err.is::<http::header::InvalidHeaderValue>()
        || err.is::<http::method::InvalidMethod>()
    {
        TransportErrorKind::Other
    } else {
        TransportErrorKind::InvalidUrl
    };
    TransportError::new(kind, err.to_string())
}

fn classify(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(..) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound => TransportErrorKind::HostNotFound,
        ureq::Error::ConnectionFailed => TransportErrorKind::ConnectionFailed,
        ureq::Error::TooManyRedirects => TransportErrorKind::TooManyRedirects,
        ureq::Error::BadUri(..) | ureq::Error::Http(..) => TransportErrorKind::InvalidUrl,
        ureq::Error::InvalidProxyUrl | ureq::Error::ConnectProxyFailed(..) => {
            TransportErrorKind::Proxy
        }
        ureq::Error::Tls(..) => TransportErrorKind::Tls,
        ureq::Error::Protocol(..) => TransportErrorKind::Protocol,
        ureq::Error::BodyExceedsLimit(..) => TransportErrorKind::BodyTooLarge,
        ureq::Error::Decompress(..) => TransportErrorKind::Decoding,
        ureq::Error::Io(io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => TransportErrorKind::ConnectionFailed,
            _ => TransportErrorKind::Receive,
        },
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}
