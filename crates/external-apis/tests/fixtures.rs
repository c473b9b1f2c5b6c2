// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Shared mock responses for the external client tests

use serde_json::{Value, json};
use url::Url;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_TIMEOUT_SECONDS: u64 = 5;

/// Parse the URI of a mock server, optionally extended with `path`
pub fn mock_url(base: &str, path: &str) -> Url {
    Url::parse(&format!("{base}{path}")).expect("mock server URI is a valid URL")
}

/// Successful `images/generations` body
pub fn image_generation_response(url: &str) -> Value {
    json!({
        "created": 1_700_000_000,
        "data": [{
            "url": url,
            "revised_prompt": "a vivid sunset over the sea"
        }]
    })
}

/// OpenAI error envelope
pub fn openai_error(message: &str, kind: &str) -> Value {
    json!({
        "error": {
            "message": message,
            "type": kind,
            "param": null,
            "code": null
        }
    })
}

/// Firestore license document
pub fn license_document(key: &str, is_active: bool, domains: &[&str]) -> Value {
    let values: Vec<Value> = domains
        .iter()
        .map(|domain| json!({ "stringValue": domain }))
        .collect();
    json!({
        "name": format!("projects/demo/databases/(default)/documents/licenses/{key}"),
        "fields": {
            "isActive": { "booleanValue": is_active },
            "domains": { "arrayValue": { "values": values } }
        },
        "createTime": "2024-05-01T10:00:00.000000Z",
        "updateTime": "2024-05-01T10:00:00.000000Z"
    })
}
