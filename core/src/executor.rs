//! The request executor.
//!
//! # Design
//! `prepare` maps a method, url and `CallOptions` onto a `PreparedRequest`
//! with no I/O. `RequestExecutor::call` runs that request through its
//! `Transport` and normalizes the outcome into a `CallResult`. The executor
//! keeps only the last result and the last error message between calls.

use tracing::{debug, warn};

use crate::error::CallError;
use crate::headers::{has_header, outgoing_headers, set_header, HeaderSource, NoInboundHeaders};
use crate::http::{HttpMethod, Payload, PreparedRequest};
use crate::options::CallOptions;
use crate::response::{split_response, CallResult};
use crate::transport::{Transport, UreqTransport};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Build the request for one call.
///
/// `inbound` are the headers of the request being served; they are filtered
/// and merged with `options.header_data` (which wins on conflicts).
pub fn prepare(
    method: HttpMethod,
    url: &str,
    options: &CallOptions,
    inbound: Vec<(String, String)>,
) -> Result<PreparedRequest, CallError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CallError::EmptyUrl);
    }
    let settings = options.transport.resolve()?;

    let mut overrides = options.header_data.clone();
    let payload = match method {
        HttpMethod::Post => Payload::Text(options.data.to_text()?),
        HttpMethod::Put => match &options.file_path {
            Some(path) if !path.as_os_str().is_empty() => {
                if !has_header(&overrides, "Accept") {
                    overrides.push(("Accept".to_string(), JSON_CONTENT_TYPE.to_string()));
                }
                Payload::File(path.clone())
            }
            _ => Payload::Text(options.data.to_text()?),
        },
        HttpMethod::Patch if !options.data.is_empty() => Payload::Text(options.data.to_text()?),
        HttpMethod::Patch | HttpMethod::Delete | HttpMethod::Get => Payload::Empty,
    };

    let mut headers = outgoing_headers(&overrides, inbound, &options.allowed_request_header_keys);

    if matches!(payload, Payload::Text(_)) && !has_header(&headers, "Content-Type") {
        let content_type = if options.data.is_structured() {
            JSON_CONTENT_TYPE
        } else {
            FORM_CONTENT_TYPE
        };
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }

    let encoding = options.encoding.trim();
    if !encoding.is_empty() {
        set_header(&mut headers, "Accept-Encoding", encoding);
    }

    // Transport options go last.
    if let Some(agent) = &settings.user_agent {
        set_header(&mut headers, "User-Agent", agent);
    }

    Ok(PreparedRequest {
        method,
        url: url.to_string(),
        headers,
        payload,
        include_headers: options.enable_response_header,
        settings,
    })
}

/// Runs single HTTP calls and remembers how the last one went.
///
/// ```no_run
/// use relay_core::{CallOptions, RequestExecutor};
///
/// let mut executor = RequestExecutor::new();
/// let result = executor.call("GET", "http://example.com", &CallOptions::default())?;
/// assert_eq!(result.code, 200);
/// # Ok::<(), relay_core::CallError>(())
/// ```
#[derive(Debug)]
pub struct RequestExecutor<S = NoInboundHeaders, T = UreqTransport> {
    headers: S,
    transport: T,
    last_error: String,
    last_result: Option<CallResult>,
}

impl RequestExecutor {
    /// Executor with no inbound headers and the `ureq` transport.
    pub fn new() -> Self {
        Self::with_parts(NoInboundHeaders, UreqTransport)
    }
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: HeaderSource, T: Transport> RequestExecutor<S, T> {
    pub fn with_parts(headers: S, transport: T) -> Self {
        Self {
            headers,
            transport,
            last_error: String::new(),
            last_result: None,
        }
    }

    pub fn with_header_source<S2: HeaderSource>(self, headers: S2) -> RequestExecutor<S2, T> {
        RequestExecutor::with_parts(headers, self.transport)
    }

    pub fn with_transport<T2: Transport>(self, transport: T2) -> RequestExecutor<S, T2> {
        RequestExecutor::with_parts(self.headers, transport)
    }

    /// Perform one blocking request.
    ///
    /// On a transport failure the error is also recorded: `error()` returns
    /// its message and `response()` the failed result with `curl_errno` set.
    pub fn call(
        &mut self,
        method: impl Into<HttpMethod>,
        url: &str,
        options: &CallOptions,
    ) -> Result<CallResult, CallError> {
        let method = method.into();
        self.last_error.clear();
        self.last_result = None;

        let request = match prepare(method, url, options, self.headers.inbound_headers()) {
            Ok(request) => request,
            Err(err) => {
                self.last_error = err.to_string();
                return Err(err);
            }
        };

        match self.transport.execute(&request) {
            Ok(raw) => {
                let result = if request.include_headers {
                    let (header, body) = split_response(&raw.text);
                    CallResult {
                        header,
                        ..CallResult::success(raw.status, body.to_string())
                    }
                } else {
                    CallResult::success(raw.status, raw.text)
                };
                debug!(method = %method, url = %request.url, code = result.code, "call completed");
                self.last_result = Some(result.clone());
                Ok(result)
            }
            Err(source) => {
                warn!(
                    method = %method,
                    url = %request.url,
                    errno = source.errno(),
                    error = %source,
                    "call failed"
                );
                self.last_error = source.message.clone();
                self.last_result = Some(CallResult::failure(&source));
                Err(CallError::Transport {
                    method,
                    url: request.url,
                    source,
                })
            }
        }
    }

    /// Message of the last failure, or `""`.
    pub fn error(&self) -> &str {
        &self.last_error
    }

    /// The last result, with `error` filled in when the call failed.
    pub fn response(&self) -> Option<CallResult> {
        let mut result = self.last_result.clone()?;
        if !self.last_error.is_empty() {
            result.error = Some(self.last_error.clone());
        }
        Some(result)
    }
}
