// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! [`JsonExtractor`] replaces `axum::Json` on every gateway endpoint so that
//! malformed bodies answer 400 with the gateway's `{"error", "status"}` shape
//! and a hint at what went wrong.

use axum::{
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

mod error_hints {
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const MISSING_BRACE: &str = "check for missing closing brace '}' for JSON object";
    pub const MISSING_BRACKET: &str = "check for missing closing bracket ']' for JSON array";
    pub const MISSING_QUOTES: &str =
        "check for missing or improperly escaped quotes around string values";
    pub const CONTROL_CHARS: &str = "JSON contains invalid control characters that must be escaped";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const DEFAULT_SYNTAX: &str = "check JSON formatting and structure";
    pub const EMPTY_BODY: &str = "request body is empty, expected valid JSON";
    pub const TRUNCATED_JSON: &str =
        "unexpected end of JSON input, request appears to be truncated";
    pub const WIDTH_RANGE: &str = "width must be a positive integer number of pixels";
}

// Bodies carry URLs and short texts only
const MAX_JSON_PAYLOAD_SIZE: usize = 64 * 1024;

/// JSON extractor that reports parsing failures as `ServerError::JsonError`
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE)
            && let Ok(content_type) = content_type.to_str()
            && !content_type.starts_with("application/json")
        {
            return Err(ServerError::JsonError {
                message: format!(
                    "invalid content-type: expected 'application/json', got '{content_type}'"
                ),
            });
        }

        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::JsonError {
                message: format!("failed to read request body: {rejection}"),
            })?;

        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(ServerError::JsonError {
                message: format!(
                    "request body too large: {} bytes (max: {MAX_JSON_PAYLOAD_SIZE} bytes)",
                    bytes.len()
                ),
            });
        }

        if bytes.is_empty() {
            return Err(ServerError::JsonError {
                message: error_hints::EMPTY_BODY.to_string(),
            });
        }

        serde_json::from_slice::<T>(&bytes)
            .map(JsonExtractor)
            .map_err(|err| ServerError::JsonError {
                message: describe_json_error(&err),
            })
    }
}

fn describe_json_error(err: &serde_json::Error) -> String {
    if err.is_eof() {
        error_hints::TRUNCATED_JSON.to_string()
    } else if err.is_syntax() {
        format!(
            "invalid JSON syntax at line {}, column {}: {}",
            err.line(),
            err.column(),
            json_syntax_hint(err)
        )
    } else if err.is_data() {
        format!("JSON data validation failed: {}", data_validation_hint(err))
    } else {
        format!("JSON parsing error: {err}")
    }
}

/// Provides helpful hints for JSON syntax errors
fn json_syntax_hint(err: &serde_json::Error) -> &'static str {
    let err_msg = err.to_string();

    if err_msg.contains("expected ','") || err_msg.contains("trailing comma") {
        error_hints::MISSING_COMMA
    } else if err_msg.contains("expected '}'") {
        error_hints::MISSING_BRACE
    } else if err_msg.contains("expected ']'") {
        error_hints::MISSING_BRACKET
    } else if err_msg.contains("expected '\"'") {
        error_hints::MISSING_QUOTES
    } else if err_msg.contains("control character") {
        error_hints::CONTROL_CHARS
    } else if err_msg.contains("expected value") {
        error_hints::EXPECTED_VALUE
    } else {
        error_hints::DEFAULT_SYNTAX
    }
}

/// Provides helpful hints for data validation errors
fn data_validation_hint(err: &serde_json::Error) -> String {
    let err_msg = err.to_string();

    if err_msg.contains("expected u32") {
        format!("{}: {err_msg}", error_hints::WIDTH_RANGE)
    } else if err_msg.contains("invalid type") {
        if err_msg.contains("expected a string") || err_msg.contains("expected string") {
            "expected a string value, but received a different data type".to_string()
        } else if err_msg.contains("expected integer") || err_msg.contains("expected number") {
            "expected a numeric value, but received a different data type".to_string()
        } else if err_msg.contains("expected struct") || err_msg.contains("expected object") {
            "expected a JSON object, but received a different data type".to_string()
        } else {
            format!("data type mismatch: {err_msg}")
        }
    } else if err_msg.contains("missing field") {
        format!("required field is missing: {err_msg}")
    } else {
        err_msg
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderValue, Method},
    };
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct ImageBody {
        description: Option<String>,
        width: Option<u32>,
    }

    fn create_request(body: &str) -> Request {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/generate-image")
            .body(Body::from(body.to_string()))
            .unwrap();

        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("application/json"));

        req
    }

    async fn json_error(body: &str) -> String {
        match JsonExtractor::<ImageBody>::from_request(create_request(body), &()).await {
            Err(ServerError::JsonError { message }) => message,
            other => panic!("expected JsonError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_json_parsing() {
        let req = create_request(r#"{"description": "A red fox 🦊", "width": 300}"#);
        let JsonExtractor(body) = JsonExtractor::<ImageBody>::from_request(req, &())
            .await
            .unwrap();

        assert_eq!(body.description.as_deref(), Some("A red fox 🦊"));
        assert_eq!(body.width, Some(300));
    }

    #[tokio::test]
    async fn optional_fields_may_be_absent() {
        let req = create_request("{}");
        let JsonExtractor(body) = JsonExtractor::<ImageBody>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(
            body,
            ImageBody {
                description: None,
                width: None
            }
        );
    }

    #[tokio::test]
    async fn empty_body_error() {
        assert!(json_error("").await.contains("request body is empty"));
    }

    #[tokio::test]
    async fn truncated_json() {
        let message = json_error(r#"{"description": "fox""#).await;
        assert!(message.contains("unexpected end of JSON input"));
    }

    #[tokio::test]
    async fn syntax_error_with_comma() {
        let message = json_error(r#"{"description": "fox",, "width": 3}"#).await;
        assert!(message.contains("invalid JSON syntax"));
        assert!(message.contains("line"));
    }

    #[tokio::test]
    async fn negative_width_is_explained() {
        let message = json_error(r#"{"description": "fox", "width": -5}"#).await;
        assert!(message.contains("JSON data validation failed"));
        assert!(message.contains("width must be a positive integer"));
    }

    #[tokio::test]
    async fn wrong_type_is_explained() {
        let message = json_error(r#"{"description": 42}"#).await;
        assert!(message.contains("expected a string value"));
    }

    #[tokio::test]
    async fn large_payload_rejection() {
        let large_body = format!(r#"{{"description": "{}"}}"#, "x".repeat(MAX_JSON_PAYLOAD_SIZE));
        let message = json_error(&large_body).await;
        assert!(message.contains("request body too large"));
    }

    #[tokio::test]
    async fn invalid_content_type() {
        let mut req = create_request(r#"{"description": "fox"}"#);
        req.headers_mut()
            .insert("content-type", HeaderValue::from_static("text/plain"));

        match JsonExtractor::<ImageBody>::from_request(req, &()).await {
            Err(ServerError::JsonError { message }) => {
                assert!(message.contains("expected 'application/json'"));
                assert!(message.contains("text/plain"));
            }
            other => panic!("expected JsonError, got {other:?}"),
        }
    }
}
