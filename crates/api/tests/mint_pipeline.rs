// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for image generation and minting

use std::time::Duration;

use api::config::TimeoutSeconds;
use axum::http::StatusCode;
use serde_json::{Value, json};
use url::Url;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_partial_json, body_string_contains, header, method, path},
};

mod fixtures;
use fixtures::*;

const GENERATED_URL: &str = "https://images.example/generated.png";
// ASCII only, multipart bodies are matched as text
const PNG_BYTES: &[u8] = b"fake-png-body";

fn mint_body() -> Value {
    json!({
        "imageUrl": GENERATED_URL,
        "name": "Dawn lighthouse",
        "description": "A lighthouse on a cliff at dawn",
        "redirectUrl": "https://shop.example/minted"
    })
}

#[tokio::test]
async fn generate_image_returns_url_and_preview() {
    let gateway = TestGateway::start().await;

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .and(header("authorization", "Bearer test-openai-key"))
        .and(body_partial_json(json!({ "prompt": "A lighthouse", "n": 1 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(image_generation_response(GENERATED_URL)),
        )
        .expect(1)
        .mount(&gateway.mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(RESIZE_PATH))
        .and(body_partial_json(json!({ "imageUrl": GENERATED_URL, "width": 128 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(resize_response(PNG_BYTES)))
        .expect(1)
        .mount(&gateway.mock_server)
        .await;

    let response = gateway
        .post(
            "/generate-image",
            &json!({ "description": "A lighthouse", "width": 128 }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let image_url = body["imageUrl"].as_str().unwrap();
    assert!(Url::parse(image_url).is_ok());
    assert_eq!(image_url, GENERATED_URL);
    assert!(!body["image"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn zero_width_falls_back_to_default_preview_width() {
    let gateway = TestGateway::start().await;

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(image_generation_response(GENERATED_URL)),
        )
        .mount(&gateway.mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(RESIZE_PATH))
        .and(body_partial_json(json!({ "imageUrl": GENERATED_URL, "width": 256 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(resize_response(PNG_BYTES)))
        .expect(1)
        .mount(&gateway.mock_server)
        .await;

    let response = gateway
        .post("/generate-image", &json!({ "description": "A lighthouse", "width": 0 }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(!body["image"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn expired_request_deadline_answers_endpoint_error() {
    let gateway = TestGateway::start_with(|config| {
        config.timeout_seconds = TimeoutSeconds::new(1).unwrap();
    })
    .await;

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_generation_response(GENERATED_URL))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&gateway.mock_server)
        .await;

    let response = gateway
        .post("/generate-image", &json!({ "description": "A lighthouse" }))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        error_body(response).await,
        json!({ "error": "Error generating image", "status": 500 })
    );
}

#[tokio::test]
async fn client_timeout_answers_endpoint_error() {
    let gateway = TestGateway::start_with(|config| {
        config.external_apis.openai.timeout_seconds = TimeoutSeconds::new(1).unwrap();
    })
    .await;

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_generation_response(GENERATED_URL))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&gateway.mock_server)
        .await;

    let response = gateway
        .post("/generate-image", &json!({ "description": "A lighthouse" }))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_body(response).await,
        json!({ "error": "Error generating image", "status": 500 })
    );
}

#[tokio::test]
async fn generate_image_without_preview() {
    let gateway =
        TestGateway::start_with(|config| config.external_apis.resize.embed_generated = false)
            .await;

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(image_generation_response(GENERATED_URL)),
        )
        .mount(&gateway.mock_server)
        .await;
    Mock::given(path(RESIZE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gateway.mock_server)
        .await;

    let response = gateway
        .post("/generate-image", &json!({ "description": "A lighthouse" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "imageUrl": GENERATED_URL }));
}

#[tokio::test]
async fn generate_image_failure() {
    let gateway = TestGateway::start().await;

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Your request was rejected", "type": "invalid_request_error" }
        })))
        .mount(&gateway.mock_server)
        .await;

    let response = gateway
        .post("/generate-image", &json!({ "description": "A lighthouse" }))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_body(response).await,
        json!({ "error": "Error generating image", "status": 500 })
    );
}

#[tokio::test]
async fn generate_image_requires_description() {
    let gateway = TestGateway::start().await;

    let response = gateway
        .post("/generate-image", &json!({ "description": "   " }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(response).await,
        json!({ "error": "Missing description", "status": 400 })
    );
    assert!(gateway.mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn mint_builds_sign_url() {
    let gateway = TestGateway::start().await;

    Mock::given(method("POST"))
        .and(path(RESIZE_PATH))
        .and(body_partial_json(json!({ "imageUrl": GENERATED_URL, "width": 512 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(resize_response(PNG_BYTES)))
        .expect(1)
        .mount(&gateway.mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(header("mb-api-key", "test-arweave-key"))
        .and(body_string_contains("fake-png-body"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "arweave-id" })))
        .expect(1)
        .mount(&gateway.mock_server)
        .await;

    let mut body = mint_body();
    body["tokenId"] = json!("7");
    let response = gateway.post("/mint", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let sign_url = Url::parse(body["signUrl"].as_str().unwrap()).unwrap();
    assert_eq!(sign_url.host_str(), Some("testnet.wallet.mintbase.xyz"));
    assert_eq!(sign_url.path(), "/sign-transaction");

    let pairs: Vec<(String, String)> = sign_url.query_pairs().into_owned().collect();
    assert_eq!(
        pairs[1],
        (
            "callback_url".to_string(),
            "https://shop.example/minted".to_string()
        )
    );

    let transactions: Value = serde_json::from_str(&pairs[0].1).unwrap();
    let tx = &transactions[0];
    assert_eq!(tx["receiverId"], TEST_MINTER);
    let args = &tx["actions"][0]["params"]["args"];
    assert_eq!(args["nft_contract_id"], TEST_CONTRACT);
    assert_eq!(args["token_id"], "7");

    let metadata: Value = serde_json::from_str(args["metadata"].as_str().unwrap()).unwrap();
    assert_eq!(metadata["reference"], "arweave-id");
    assert_eq!(metadata["title"], "Dawn lighthouse");
}

#[tokio::test]
async fn mint_stops_when_upload_fails() {
    let gateway = TestGateway::start().await;

    Mock::given(method("POST"))
        .and(path(RESIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(resize_response(PNG_BYTES)))
        .mount(&gateway.mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&gateway.mock_server)
        .await;

    let response = gateway.post("/mint", &mint_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert_eq!(body, json!({ "error": "Error in minting process", "status": 500 }));
    assert!(body.get("signUrl").is_none());
}

#[tokio::test]
async fn mint_requires_every_field() {
    let gateway = TestGateway::start().await;

    for (field, message) in [
        ("imageUrl", "Missing imageUrl"),
        ("name", "Missing name"),
        ("description", "Missing description"),
        ("redirectUrl", "Missing redirectUrl"),
    ] {
        let mut body = mint_body();
        body.as_object_mut().unwrap().remove(field);

        let response = gateway.post("/mint", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(
            error_body(response).await,
            json!({ "error": message, "status": 400 })
        );
    }

    assert!(gateway.mock_server.received_requests().await.unwrap().is_empty());
}
