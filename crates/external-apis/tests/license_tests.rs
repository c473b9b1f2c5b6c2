// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the license store and the license verification client

use external_apis::{
    FirestoreConfig, FirestoreError, FirestoreLicenseStore, LicenseVerificationClient,
    LicenseVerificationConfig, LicenseVerificationError,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, query_param},
};

mod fixtures;
use fixtures::*;

const DOCUMENT_PATH: &str = "/v1/projects/demo-project/databases/(default)/documents/licenses";

fn license_store(mock_server: &MockServer) -> FirestoreLicenseStore {
    let mut config = FirestoreConfig::new("demo-project", TEST_API_KEY)
        .unwrap()
        .with_base_url(mock_url(&mock_server.uri(), "/v1"));
    config.timeout_seconds = TEST_TIMEOUT_SECONDS;
    FirestoreLicenseStore::new(config).unwrap()
}

fn verifier(mock_server: &MockServer) -> LicenseVerificationClient {
    let mut config =
        LicenseVerificationConfig::new(mock_url(&mock_server.uri(), "/verify-license"));
    config.timeout_seconds = TEST_TIMEOUT_SECONDS;
    LicenseVerificationClient::new(config).unwrap()
}

#[tokio::test]
async fn get_license_decodes_document() {
    let mock_server = MockServer::start().await;
    let store = license_store(&mock_server);

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENT_PATH}/lic-1")))
        .and(query_param("key", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(license_document(
            "lic-1",
            true,
            &["shop.example", "blog.example"],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let record = store.get_license("lic-1").await.unwrap().unwrap();
    assert_eq!(record.key, "lic-1");
    assert!(record.is_active);
    assert!(record.permits("blog.example"));
    assert!(!record.permits("other.example"));
}

#[tokio::test]
async fn get_license_missing_document() {
    let mock_server = MockServer::start().await;
    let store = license_store(&mock_server);

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENT_PATH}/unknown")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .mount(&mock_server)
        .await;

    assert!(store.get_license("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn get_license_inactive_record() {
    let mock_server = MockServer::start().await;
    let store = license_store(&mock_server);

    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENT_PATH}/lic-2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(license_document(
            "lic-2",
            false,
            &["shop.example"],
        )))
        .mount(&mock_server)
        .await;

    let record = store.get_license("lic-2").await.unwrap().unwrap();
    assert!(!record.permits("shop.example"));
}

#[tokio::test]
async fn get_license_rejected_key() {
    let mock_server = MockServer::start().await;
    let store = license_store(&mock_server);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let err = store.get_license("lic-1").await.unwrap_err();
    assert!(matches!(err, FirestoreError::Unauthorized));
}

#[tokio::test]
async fn get_license_server_error() {
    let mock_server = MockServer::start().await;
    let store = license_store(&mock_server);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&mock_server)
        .await;

    let err = store.get_license("lic-1").await.unwrap_err();
    assert!(matches!(err, FirestoreError::ApiError { status: 500, .. }));
}

#[tokio::test]
async fn verify_accepts_success() {
    let mock_server = MockServer::start().await;
    let client = verifier(&mock_server);

    Mock::given(method("POST"))
        .and(path("/verify-license"))
        .and(body_json(json!({ "licenseKey": "lic-1", "domain": "shop.example" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "verified": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(client.verify("lic-1", "shop.example").await.unwrap());
}

#[tokio::test]
async fn verify_refuses_client_errors() {
    let mock_server = MockServer::start().await;
    let client = verifier(&mock_server);

    Mock::given(method("POST"))
        .and(path("/verify-license"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "verified": false,
            "error": "License key is not active or domain is not allowed"
        })))
        .mount(&mock_server)
        .await;

    assert!(!client.verify("lic-1", "shop.example").await.unwrap());
}

#[tokio::test]
async fn verify_reports_server_errors() {
    let mock_server = MockServer::start().await;
    let client = verifier(&mock_server);

    Mock::given(method("POST"))
        .and(path("/verify-license"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = client.verify("lic-1", "shop.example").await.unwrap_err();
    assert!(matches!(
        err,
        LicenseVerificationError::ServerError { status: 503 }
    ));
}
