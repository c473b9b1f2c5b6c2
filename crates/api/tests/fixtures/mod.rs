// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Test gateway wired to a single mock server
//!
//! Every outbound collaborator of the gateway points at one `MockServer`, at
//! the paths below. Tests mount the responses they need and count requests
//! with `expect`.

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::MockServer;

pub const OPENAI_PATH: &str = "/v1/images/generations";
pub const RESIZE_PATH: &str = "/resize";
pub const UPLOAD_PATH: &str = "/upload";
pub const INDEXER_PATH: &str = "/graphql";
pub const VERIFY_PATH: &str = "/verify-license";
pub const LICENSE_DOCUMENTS_PATH: &str =
    "/v1/projects/test-project/databases/(default)/documents/licenses";

pub const TEST_CONTRACT: &str = "test.mintspace2.testnet";
pub const TEST_MINTER: &str = "minter.test.testnet";
pub const TEST_LICENSE_KEY: &str = "lic-test";
pub const TEST_ORIGIN: &str = "https://shop.example";

/// Running gateway plus the mock server behind it
pub struct TestGateway {
    pub addr: SocketAddr,
    pub mock_server: MockServer,
    pub client: reqwest::Client,
    shutdown: CancellationToken,
}

impl TestGateway {
    /// Gateway with the license gate disabled
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Gateway with the license gate enabled
    pub async fn start_gated() -> Self {
        Self::start_with(|config| config.license_gate.enabled = true).await
    }

    /// Gateway with a customized configuration
    pub async fn start_with(customize: impl FnOnce(&mut ServerConfig)) -> Self {
        let mock_server = MockServer::start().await;
        let mut config = config_for(&mock_server.uri());
        customize(&mut config);

        let (addr, shutdown) = Server::new(config, ShutdownConfig::default())
            .expect("Failed to create server")
            .run_for_testing()
            .await
            .expect("Failed to start test server");

        Self {
            addr,
            mock_server,
            client: reqwest::Client::new(),
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POST `body` as JSON to `path`
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn mock_url(base: &str, path: &str) -> Url {
    Url::parse(&format!("{base}{path}")).expect("mock server URI is a valid URL")
}

/// Testing configuration with every collaborator at `base`
pub fn config_for(base: &str) -> ServerConfig {
    let mut config = ServerConfig::for_testing();
    let apis = &mut config.external_apis;
    apis.openai.base_url = mock_url(base, "/v1");
    apis.resize.url = mock_url(base, RESIZE_PATH);
    apis.arweave.upload_url = mock_url(base, UPLOAD_PATH);
    apis.firestore.base_url = mock_url(base, "/v1");
    apis.license_verification.url = mock_url(base, VERIFY_PATH);
    config.networks.testnet.indexer_url = mock_url(base, INDEXER_PATH);
    config
}

/// Successful `images/generations` body
pub fn image_generation_response(url: &str) -> Value {
    json!({
        "created": 1_700_000_000,
        "data": [{ "url": url }]
    })
}

/// Successful resize body carrying `png` as base64
pub fn resize_response(png: &[u8]) -> Value {
    json!({ "base64Image": STANDARD.encode(png) })
}

/// Firestore license document
pub fn license_document(key: &str, is_active: bool, domains: &[&str]) -> Value {
    let values: Vec<Value> = domains
        .iter()
        .map(|domain| json!({ "stringValue": domain }))
        .collect();
    json!({
        "name": format!("projects/test-project/databases/(default)/documents/licenses/{key}"),
        "fields": {
            "isActive": { "booleanValue": is_active },
            "domains": { "arrayValue": { "values": values } }
        }
    })
}

/// Error body as the gateway renders it
pub async fn error_body(response: reqwest::Response) -> Value {
    response.json().await.expect("error body is JSON")
}
