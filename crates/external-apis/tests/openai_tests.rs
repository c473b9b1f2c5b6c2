// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `OpenAiClient`

use api_client::{ApiClient, ApiError, HealthStatus};
use external_apis::{OpenAiClient, OpenAiConfig, OpenAiError};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

mod fixtures;
use fixtures::*;

fn create_test_client(mock_server: &MockServer) -> OpenAiClient {
    let mut config = OpenAiConfig::new(TEST_API_KEY)
        .unwrap()
        .with_base_url(mock_url(&mock_server.uri(), "/v1"));
    config.timeout_seconds = TEST_TIMEOUT_SECONDS;
    OpenAiClient::new(config).unwrap()
}

#[tokio::test]
async fn generate_image_success() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "dall-e-3",
            "prompt": "a sunset over the sea",
            "n": 1,
            "size": "1024x1024",
            "style": "vivid",
            "response_format": "url"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_generation_response(
            "https://images.example/generated/abc.png",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let image = client.generate_image("a sunset over the sea").await.unwrap();

    assert_eq!(image.url.as_str(), "https://images.example/generated/abc.png");
    assert_eq!(
        image.revised_prompt.as_deref(),
        Some("a vivid sunset over the sea")
    );
}

#[tokio::test]
async fn generate_image_without_data_is_invalid() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "created": 1, "data": [] })))
        .mount(&mock_server)
        .await;

    let result = client.generate_image("anything").await;
    assert!(matches!(result, Err(OpenAiError::InvalidResponse(_))));
}

#[tokio::test]
async fn generate_image_with_malformed_url_is_invalid() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(image_generation_response("not a url")),
        )
        .mount(&mock_server)
        .await;

    let result = client.generate_image("anything").await;
    assert!(matches!(result, Err(OpenAiError::InvalidResponse(_))));
}

#[tokio::test]
async fn generate_image_unauthorized() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(openai_error("Incorrect API key provided", "invalid_request_error")),
        )
        .mount(&mock_server)
        .await;

    let err = client.generate_image("anything").await.unwrap_err();
    assert!(matches!(err, OpenAiError::Unauthorized));
    assert!(matches!(ApiError::from(err), ApiError::Authentication { .. }));
}

#[tokio::test]
async fn generate_image_content_policy_rejection() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(openai_error(
            "Your request was rejected as a result of our safety system.",
            "invalid_request_error",
        )))
        .mount(&mock_server)
        .await;

    let err = client.generate_image("anything").await.unwrap_err();
    match err {
        OpenAiError::Rejected { message } => assert!(message.contains("safety system")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn generate_image_rate_limited() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client.generate_image("anything").await.unwrap_err();
    assert!(matches!(err, OpenAiError::RateLimited));
}

#[tokio::test]
async fn health_check_statuses() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(&mock_server);

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    assert_eq!(client.health_check().await.unwrap(), HealthStatus::Up);
    assert!(client.health_check().await.unwrap().is_down());
}
