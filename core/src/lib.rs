//! Blocking HTTP request executor.
//!
//! # Overview
//! `RequestExecutor::call(method, url, options)` performs one GET, POST, PUT,
//! PATCH or DELETE request and returns a normalized `CallResult`: status
//! code, body, and optionally the parsed response header block. Transport
//! failures come back as `CallError::Transport` and are also kept on the
//! executor (`error()`, `response()`).
//!
//! # Design
//! - `prepare` builds a plain-data `PreparedRequest` without touching the
//!   network; a `Transport` executes it. `UreqTransport` is the default.
//! - Inbound headers to forward come from an explicit `HeaderSource`, never
//!   from hidden global state.
//! - Transport tuning is a typed `TransportOptions` struct, validated before
//!   any I/O.

pub mod error;
pub mod executor;
pub mod headers;
pub mod http;
pub mod options;
pub mod response;
pub mod transport;

pub use error::{CallError, TransportError, TransportErrorKind};
pub use executor::{prepare, RequestExecutor};
pub use headers::{CgiEnvHeaders, HeaderSource, NoInboundHeaders, StaticHeaders};
pub use http::{HttpMethod, Payload, PreparedRequest, RawResponse};
pub use options::{
    CallOptions, RequestBody, TransportOptions, TransportSettings, DEFAULT_TIMEOUT_SECS,
};
pub use response::{split_response, CallResult, ResponseHeader};
pub use transport::{Transport, UreqTransport};
