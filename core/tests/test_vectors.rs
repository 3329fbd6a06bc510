//! Check header resolution and response splitting against the JSON vectors
//! stored in `test-vectors/`.
//!
//! Header lists are compared as ordered pairs; parsed response headers are
//! compared as JSON so the synthetic `http_code` entry is checked alongside
//! the fields.

use relay_core::headers::outgoing_headers;
use relay_core::split_response;

fn pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

#[test]
fn header_test_vectors() {
    let raw = include_str!("../../test-vectors/headers.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let resolved = outgoing_headers(
            &pairs(&case["overrides"]),
            pairs(&case["inbound"]),
            &strings(&case["allowed"]),
        );
        assert_eq!(resolved, pairs(&case["expected"]), "{name}");
    }
}

// ---------------------------------------------------------------------------
// Response splitting
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (header, data) = split_response(case["raw"].as_str().unwrap());

        assert_eq!(data, case["expected_data"].as_str().unwrap(), "{name}: data");
        let header = serde_json::to_value(&header).unwrap();
        assert_eq!(header, case["expected_header"], "{name}: header");
    }
}
