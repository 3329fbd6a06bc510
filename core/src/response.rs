//! Normalized call results.
//!
//! `CallResult` serializes to the flat shape callers store or relay:
//! `code`, `data`, and when present `header`, `curlErrNo` and `error`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Status reported when the transport produced no status code.
pub const FALLBACK_STATUS: u16 = 500;

/// Outcome of one `RequestExecutor::call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub code: u16,
    /// Response body decoded as UTF-8. Invalid sequences, as in binary
    /// payloads, are replaced with U+FFFD, so this is not byte-exact.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<ResponseHeader>,
    #[serde(rename = "curlErrNo", default, skip_serializing_if = "Option::is_none")]
    pub curl_errno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallResult {
    pub fn success(status: Option<u16>, data: String) -> Self {
        Self {
            code: status.unwrap_or(FALLBACK_STATUS),
            data,
            header: None,
            curl_errno: None,
            error: None,
        }
    }

    pub fn failure(error: &TransportError) -> Self {
        Self {
            code: FALLBACK_STATUS,
            data: String::new(),
            header: None,
            curl_errno: Some(error.errno()),
            error: Some(error.message.clone()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.code)
    }
}

/// Parsed response header block.
///
/// `http_code` is the first line of the header block (`HTTP/1.1 200 OK`).
/// With `UreqTransport` that line is rebuilt from the parsed status, so the
/// reason phrase is the canonical one rather than what the server sent.
/// Repeated header names keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub http_code: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ResponseHeader {
    /// Numeric status taken from the status line.
    pub fn status_code(&self) -> Option<u16> {
        self.http_code.split_whitespace().nth(1)?.parse().ok()
    }

    /// Field value, looked up ASCII case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Split `<header block>\r\n\r\n<body>`.
///
/// The header block ends at the first blank line. Its first line is kept as
/// the status line; the rest are `Name: value` pairs, and lines without a
/// colon are dropped. Without a blank line the whole text is body.
pub fn split_response(raw: &str) -> (Option<ResponseHeader>, &str) {
    let Some(end) = raw.find("\r\n\r\n") else {
        return (None, raw);
    };
    let (block, body) = (&raw[..end], &raw[end + 4..]);

    let mut lines = block.split("\r\n");
    let mut header = ResponseHeader {
        http_code: lines.next().unwrap_or_default().to_string(),
        fields: BTreeMap::new(),
    };
    for line in lines {
        let pair = line.split_once(": ").or_else(|| line.split_once(':'));
        if let Some((name, value)) = pair {
            header.fields.insert(name.to_string(), value.to_string());
        }
    }
    (Some(header), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;

    #[test]
    fn split_separates_status_line_fields_and_body() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-Id: 42\r\n\r\nhello";
        let (header, body) = split_response(raw);
        let header = header.unwrap();
        assert_eq!(header.http_code, "HTTP/1.1 200 OK");
        assert_eq!(header.status_code(), Some(200));
        assert_eq!(header.get("content-type"), Some("text/plain"));
        assert_eq!(header.get("X-Id"), Some("42"));
        assert_eq!(body, "hello");
    }

    #[test]
    fn split_keeps_blank_lines_inside_the_body() {
        let raw = "HTTP/1.1 200 OK\r\n\r\nline1\r\n\r\nline2";
        let (header, body) = split_response(raw);
        assert!(header.unwrap().fields.is_empty());
        assert_eq!(body, "line1\r\n\r\nline2");
    }

    #[test]
    fn split_keeps_colons_in_values() {
        let raw = "HTTP/1.1 301 Moved\r\nLocation: http://example.com:8080/x\r\n\r\n";
        let (header, body) = split_response(raw);
        let header = header.unwrap();
        assert_eq!(header.get("location"), Some("http://example.com:8080/x"));
        assert_eq!(header.status_code(), Some(301));
        assert_eq!(body, "");
    }

    #[test]
    fn split_without_separator_is_all_body() {
        let (header, body) = split_response("just a body");
        assert!(header.is_none());
        assert_eq!(body, "just a body");
    }

    #[test]
    fn missing_status_defaults_to_500() {
        let result = CallResult::success(None, "x".to_string());
        assert_eq!(result.code, 500);
        assert!(!result.is_success());
    }

    #[test]
    fn failure_carries_errno_and_message() {
        let err = TransportError::new(TransportErrorKind::ConnectionFailed, "connection refused");
        let result = CallResult::failure(&err);
        assert_eq!(result.curl_errno, Some(7));
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        assert!(result.data.is_empty());
    }

    #[test]
    fn result_serializes_to_flat_shape() {
        let (header, body) = split_response("HTTP/1.1 200 OK\r\nServer: test\r\n\r\nok");
        let result = CallResult {
            header,
            ..CallResult::success(Some(200), body.to_string())
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"], "ok");
        assert_eq!(json["header"]["http_code"], "HTTP/1.1 200 OK");
        assert_eq!(json["header"]["Server"], "test");
        assert!(json.get("curlErrNo").is_none());
        assert!(json.get("error").is_none());
    }
}
