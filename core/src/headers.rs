//! Outgoing header resolution.
//!
//! # Design
//! Inbound headers (the ones the hosting process received) come from a
//! `HeaderSource` handed to the executor, so nothing here reads global
//! state on its own. Resolution is:
//!
//! 1. take the inbound headers, optionally narrowed by an allow-list;
//! 2. put explicit overrides in front and drop inbound headers they shadow;
//! 3. strip `Content-Length`, which the transport computes itself.
//!
//! Header names are compared ASCII case-insensitively throughout.

/// Supplies the headers of the request currently being served.
pub trait HeaderSource {
    fn inbound_headers(&self) -> Vec<(String, String)>;
}

impl<S: HeaderSource + ?Sized> HeaderSource for &S {
    fn inbound_headers(&self) -> Vec<(String, String)> {
        (**self).inbound_headers()
    }
}

/// No inbound request: nothing is forwarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInboundHeaders;

impl HeaderSource for NoInboundHeaders {
    fn inbound_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// A fixed header list, e.g. taken from a server framework's request.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: Vec<(String, String)>,
}

impl StaticHeaders {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl HeaderSource for StaticHeaders {
    fn inbound_headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }
}

/// Headers recovered from CGI-style `HTTP_*` variables.
///
/// `HTTP_X_FORWARDED_FOR=1.2.3.4` becomes `X-Forwarded-For: 1.2.3.4`.
/// Variables without the prefix are ignored.
#[derive(Debug, Clone, Default)]
pub struct CgiEnvHeaders {
    headers: Vec<(String, String)>,
}

impl CgiEnvHeaders {
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = vars
            .into_iter()
            .filter_map(|(name, value)| {
                cgi_variable_to_header(name.as_ref()).map(|header| (header, value.into()))
            })
            .collect();
        Self { headers }
    }

    /// Scan the current process environment. Names and values that are not
    /// valid UTF-8 are converted lossily.
    pub fn from_process_env() -> Self {
        Self::from_vars(std::env::vars_os().map(|(name, value)| {
            (
                name.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        }))
    }
}

impl HeaderSource for CgiEnvHeaders {
    fn inbound_headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }
}

fn cgi_variable_to_header(name: &str) -> Option<String> {
    let rest = name.strip_prefix("HTTP_")?;
    if rest.is_empty() {
        return None;
    }
    let words: Vec<String> = rest
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    Some(words.join("-"))
}

/// Split a raw `Name: value` line. Returns `None` when there is no colon or
/// the name is blank.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Apply the allow-list to inbound headers.
///
/// An empty allow-list forwards everything. Otherwise only listed names with
/// a non-empty value are kept; a list that matches nothing forwards nothing.
pub fn resolve_inbound(inbound: Vec<(String, String)>, allowed: &[String]) -> Vec<(String, String)> {
    if allowed.is_empty() {
        return inbound;
    }
    inbound
        .into_iter()
        .filter(|(name, value)| {
            !value.is_empty() && allowed.iter().any(|key| key.eq_ignore_ascii_case(name))
        })
        .collect()
}

/// Overrides first, then inbound headers that no override shadows.
pub fn merge(overrides: &[(String, String)], inbound: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut merged = overrides.to_vec();
    merged.extend(
        inbound
            .into_iter()
            .filter(|(name, _)| !overrides.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))),
    );
    merged
}

pub fn strip_content_length(headers: &mut Vec<(String, String)>) {
    headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-length"));
}

/// Replace every `name` header with a single one, keeping the position of
/// the first occurrence.
pub fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter().position(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(index) => {
            headers[index].1 = value.to_string();
            let mut seen = 0usize;
            headers.retain(|(key, _)| {
                if key.eq_ignore_ascii_case(name) {
                    seen += 1;
                    seen == 1
                } else {
                    true
                }
            });
        }
        None => headers.push((name.to_string(), value.to_string())),
    }
}

pub fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// Full pipeline: filter, merge, strip `Content-Length`.
pub fn outgoing_headers(
    overrides: &[(String, String)],
    inbound: Vec<(String, String)>,
    allowed: &[String],
) -> Vec<(String, String)> {
    let mut headers = merge(overrides, resolve_inbound(inbound, allowed));
    strip_content_length(&mut headers);
    headers
}
