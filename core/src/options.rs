//! Per-call request options.
//!
//! # Design
//! `CallOptions` is a serde type so a whole call can be described in JSON
//! (config file, queued job, test vector). Transport tuning goes through the
//! typed `TransportOptions` rather than a free-form option map; conflicting
//! values are rejected by `TransportOptions::resolve` before any I/O happens.

use std::path::PathBuf;
use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::CallError;
use crate::headers::parse_header_line;

/// Total request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 59;

/// Redirect hops followed when none is configured.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Request body, either raw text or a structured value sent as JSON.
///
/// Deserializes untagged: `null` is `Empty`, a JSON string is `Text`,
/// anything else is `Json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Json(serde_json::Value),
}

impl RequestBody {
    /// Serialize `value` into a structured body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, CallError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| CallError::SerializationError(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Text(text) => text.is_empty(),
            RequestBody::Json(_) => false,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, RequestBody::Json(_))
    }

    /// The body as it goes on the wire. `Empty` becomes an empty string.
    pub fn to_text(&self) -> Result<String, CallError> {
        match self {
            RequestBody::Empty => Ok(String::new()),
            RequestBody::Text(text) => Ok(text.clone()),
            RequestBody::Json(value) => serde_json::to_string(value)
                .map_err(|e| CallError::SerializationError(e.to_string())),
        }
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Options for a single `RequestExecutor::call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallOptions {
    pub data: RequestBody,
    /// Explicit headers, in send order. These win over inbound headers.
    /// Documents may give each entry as `["Name", "value"]` or `"Name: value"`.
    #[serde(deserialize_with = "header_list")]
    pub header_data: Vec<(String, String)>,
    /// When non-empty, only inbound headers named here are forwarded.
    pub allowed_request_header_keys: Vec<String>,
    /// Sent as `Accept-Encoding` when non-empty.
    pub encoding: String,
    pub enable_response_header: bool,
    /// PUT only: stream this file as the request body.
    pub file_path: Option<PathBuf>,
    #[serde(alias = "curlOptions")]
    pub transport: TransportOptions,
}

impl CallOptions {
    /// Parse options from a JSON document.
    pub fn from_json(document: &str) -> Result<Self, CallError> {
        serde_json::from_str(document).map_err(|e| CallError::Config(e.to_string()))
    }

    pub fn data(mut self, body: impl Into<RequestBody>) -> Self {
        self.data = body.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_data.push((name.into(), value.into()));
        self
    }

    /// Add a raw `Name: value` line. Lines without a colon are ignored.
    pub fn header_line(mut self, line: &str) -> Self {
        if let Some(header) = parse_header_line(line) {
            self.header_data.push(header);
        }
        self
    }

    pub fn allow_header(mut self, name: impl Into<String>) -> Self {
        self.allowed_request_header_keys.push(name.into());
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn response_header(mut self, enabled: bool) -> Self {
        self.enable_response_header = enabled;
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderEntry {
    Pair(String, String),
    Line(String),
}

fn header_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, String)>, D::Error> {
    Vec::<HeaderEntry>::deserialize(deserializer)?
        .into_iter()
        .map(|entry| match entry {
            HeaderEntry::Pair(name, value) => Ok((name, value)),
            HeaderEntry::Line(line) => parse_header_line(&line)
                .ok_or_else(|| de::Error::custom(format!("malformed header line: {line:?}"))),
        })
        .collect()
}

/// Transport tuning. Every field is optional and overrides the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TransportOptions {
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub follow_redirects: Option<bool>,
    pub max_redirects: Option<u32>,
    pub proxy: Option<String>,
    pub verify_tls: Option<bool>,
    pub user_agent: Option<String>,
    /// Cap on the buffered response body. Unlimited when unset.
    pub max_body_bytes: Option<u64>,
}

impl TransportOptions {
    /// Validate and fill in defaults.
    pub fn resolve(&self) -> Result<TransportSettings, CallError> {
        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CallError::InvalidOption(
                "timeoutSecs must be greater than zero".to_string(),
            ));
        }

        let connect_timeout = match self.connect_timeout_secs {
            Some(0) => {
                return Err(CallError::InvalidOption(
                    "connectTimeoutSecs must be greater than zero".to_string(),
                ))
            }
            Some(secs) if secs > timeout_secs => {
                return Err(CallError::InvalidOption(format!(
                    "connectTimeoutSecs ({secs}) exceeds timeoutSecs ({timeout_secs})"
                )))
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let max_redirects = match (self.follow_redirects, self.max_redirects) {
            (Some(false), Some(n)) if n > 0 => {
                return Err(CallError::InvalidOption(
                    "maxRedirects is set but followRedirects is false".to_string(),
                ))
            }
            (Some(true), Some(0)) => {
                return Err(CallError::InvalidOption(
                    "followRedirects is true but maxRedirects is zero".to_string(),
                ))
            }
            (Some(false), _) => 0,
            (_, Some(n)) => n,
            (_, None) => DEFAULT_MAX_REDIRECTS,
        };

        let proxy = match &self.proxy {
            Some(proxy) if proxy.trim().is_empty() => {
                return Err(CallError::InvalidOption("proxy must not be empty".to_string()))
            }
            Some(proxy) => Some(proxy.trim().to_string()),
            None => None,
        };

        let user_agent = match &self.user_agent {
            Some(agent) if agent.trim().is_empty() => {
                return Err(CallError::InvalidOption(
                    "userAgent must not be empty".to_string(),
                ))
            }
            other => other.clone(),
        };

        if self.max_body_bytes == Some(0) {
            return Err(CallError::InvalidOption(
                "maxBodyBytes must be greater than zero".to_string(),
            ));
        }

        Ok(TransportSettings {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout,
            max_redirects,
            proxy,
            verify_tls: self.verify_tls.unwrap_or(true),
            user_agent,
            max_body_bytes: self.max_body_bytes,
        })
    }
}

/// Validated transport configuration handed to a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub timeout: Duration,
    pub connect_timeout: Option<Duration>,
    /// Zero disables redirect following.
    pub max_redirects: u32,
    pub proxy: Option<String>,
    pub verify_tls: bool,
    pub user_agent: Option<String>,
    /// `None` buffers the whole body.
    pub max_body_bytes: Option<u64>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            proxy: None,
            verify_tls: true,
            user_agent: None,
            max_body_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_resolve_to_default_settings() {
        let settings = TransportOptions::default().resolve().unwrap();
        assert_eq!(settings, TransportSettings::default());
        assert_eq!(settings.timeout, Duration::from_secs(59));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let options = TransportOptions {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(options.resolve(), Err(CallError::InvalidOption(_))));
    }

    #[test]
    fn connect_timeout_cannot_exceed_total_timeout() {
        let options = TransportOptions {
            timeout_secs: Some(5),
            connect_timeout_secs: Some(10),
            ..Default::default()
        };
        let err = options.resolve().unwrap_err();
        assert!(err.to_string().contains("connectTimeoutSecs (10)"));
    }

    #[test]
    fn disabling_redirects_with_a_limit_is_rejected() {
        let options = TransportOptions {
            follow_redirects: Some(false),
            max_redirects: Some(3),
            ..Default::default()
        };
        assert!(matches!(options.resolve(), Err(CallError::InvalidOption(_))));
    }

    #[test]
    fn disabling_redirects_sets_limit_to_zero() {
        let options = TransportOptions {
            follow_redirects: Some(false),
            ..Default::default()
        };
        assert_eq!(options.resolve().unwrap().max_redirects, 0);
    }

    #[test]
    fn body_limit_defaults_to_unlimited() {
        assert_eq!(TransportOptions::default().resolve().unwrap().max_body_bytes, None);

        let options = TransportOptions {
            max_body_bytes: Some(0),
            ..Default::default()
        };
        assert!(matches!(options.resolve(), Err(CallError::InvalidOption(_))));
    }

    #[test]
    fn blank_proxy_is_rejected() {
        let options = TransportOptions {
            proxy: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(options.resolve(), Err(CallError::InvalidOption(_))));
    }

    #[test]
    fn options_parse_from_camel_case_json() {
        let options = CallOptions::from_json(
            r#"{
                "data": {"name": "Ada"},
                "headerData": [["X-Trace", "abc"]],
                "allowedRequestHeaderKeys": ["Authorization"],
                "encoding": "gzip",
                "enableResponseHeader": true,
                "curlOptions": {"timeoutSecs": 5}
            }"#,
        )
        .unwrap();

        assert_eq!(options.data, RequestBody::Json(json!({"name": "Ada"})));
        assert_eq!(
            options.header_data,
            vec![("X-Trace".to_string(), "abc".to_string())]
        );
        assert_eq!(options.allowed_request_header_keys, vec!["Authorization"]);
        assert_eq!(options.encoding, "gzip");
        assert!(options.enable_response_header);
        assert_eq!(options.transport.timeout_secs, Some(5));
    }

    #[test]
    fn header_data_accepts_raw_lines_and_pairs() {
        let options = CallOptions::from_json(
            r#"{"headerData": ["Accept: application/json", ["X-Trace", "abc"], "Link: <http://a:1>"]}"#,
        )
        .unwrap();
        assert_eq!(
            options.header_data,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Trace".to_string(), "abc".to_string()),
                ("Link".to_string(), "<http://a:1>".to_string()),
            ]
        );
    }

    #[test]
    fn header_line_without_colon_is_a_config_error() {
        let err = CallOptions::from_json(r#"{"headerData": ["no colon here"]}"#).unwrap_err();
        assert!(matches!(err, CallError::Config(_)));
    }

    #[test]
    fn unknown_transport_option_is_a_config_error() {
        let err = CallOptions::from_json(r#"{"transport": {"CURLOPT_VERBOSE": 1}}"#).unwrap_err();
        assert!(matches!(err, CallError::Config(_)));
    }

    #[test]
    fn string_data_stays_text() {
        let options = CallOptions::from_json(r#"{"data": "a=1&b=2"}"#).unwrap();
        assert_eq!(options.data, RequestBody::Text("a=1&b=2".to_string()));
        assert_eq!(options.data.to_text().unwrap(), "a=1&b=2");
    }

    #[test]
    fn structured_data_serializes_to_json_text() {
        let body = RequestBody::from(json!({"id": 7}));
        assert_eq!(body.to_text().unwrap(), r#"{"id":7}"#);
        assert!(!body.is_empty());
    }

    #[test]
    fn header_line_splits_name_and_value() {
        let options = CallOptions::default()
            .header_line("Accept: text/html")
            .header_line("garbage");
        assert_eq!(
            options.header_data,
            vec![("Accept".to_string(), "text/html".to_string())]
        );
    }
}
