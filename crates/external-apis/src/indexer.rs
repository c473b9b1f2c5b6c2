// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Mintbase indexer client
//!
//! This module queries the Mintbase GraphQL indexer for token and metadata
//! records. All user input travels as GraphQL variables.

use std::time::Duration;

use api_client::{ApiClient, ApiError, HealthStatus};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::{NonEmptyString, USER_AGENT};

/// Header carrying the Mintbase GraphQL API key
pub const INDEXER_API_KEY_HEADER: &str = "mb-api-key";

const DEFAULT_INDEXER_TIMEOUT_SECONDS: u64 = 20;
const HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;

const TOKEN_METADATA_QUERY: &str = r"query TokenMetadata($tokenId: String!, $contractId: String!) {
  nft_tokens(where: {token_id: {_eq: $tokenId}, nft_contract_id: {_eq: $contractId}}, limit: 1) {
    metadata_id
  }
}";

const METADATA_BY_REFERENCE_QUERY: &str = r"query MetadataByReference($reference: String!) {
  nft_metadata(where: {reference: {_eq: $reference}}, limit: 1) {
    id
  }
}";

const HEALTH_QUERY: &str = "query Health { __typename }";

/// Configuration for the indexer client
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// GraphQL endpoint of the active network
    pub endpoint: Url,
    /// Mintbase API key
    pub api_key: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl IndexerConfig {
    /// Create a validated configuration with the default timeout
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::Config` if the API key is blank.
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Result<Self, IndexerError> {
        Ok(Self {
            endpoint,
            api_key: NonEmptyString::new(api_key).map_err(IndexerError::Config)?,
            timeout_seconds: DEFAULT_INDEXER_TIMEOUT_SECONDS,
        })
    }
}

/// Errors specific to the indexer client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum IndexerError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Indexer returned an HTTP error
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Query was answered with GraphQL errors
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Query matched nothing
    #[error("{0} not found")]
    NotFound(String),

    /// Authentication failed
    #[error("Authentication failed")]
    Unauthorized,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<IndexerError> for ApiError {
    fn from(value: IndexerError) -> Self {
        match value {
            IndexerError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            IndexerError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            IndexerError::GraphQl(message) => ApiError::InvalidResponse { message },
            IndexerError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            IndexerError::NotFound(resource) => ApiError::NotFound { resource },
            IndexerError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            IndexerError::Config(message) => ApiError::Configuration { message },
            IndexerError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

/// Standard GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TokensData {
    #[serde(default)]
    nft_tokens: Vec<TokenRow>,
}

#[derive(Debug, Deserialize)]
struct TokenRow {
    metadata_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataData {
    #[serde(default)]
    nft_metadata: Vec<MetadataRow>,
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    id: String,
}

/// Mintbase GraphQL indexer client
#[derive(Debug, Clone)]
pub struct IndexerClient {
    client: Client,
    config: IndexerConfig,
}

impl IndexerClient {
    /// Create a new indexer client
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::Http` if the HTTP client cannot be built.
    pub fn new(config: IndexerConfig) -> Result<Self, IndexerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Metadata id of token `token_id` on `nft_contract_id`
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::NotFound` when no such token exists, or any
    /// transport or GraphQL error.
    #[instrument(skip(self))]
    pub async fn token_metadata_id(
        &self,
        token_id: &str,
        nft_contract_id: &str,
    ) -> Result<String, IndexerError> {
        let data: TokensData = self
            .query(
                TOKEN_METADATA_QUERY,
                json!({ "tokenId": token_id, "contractId": nft_contract_id }),
            )
            .await?;

        data.nft_tokens
            .into_iter()
            .find_map(|token| token.metadata_id)
            .ok_or_else(|| IndexerError::NotFound(format!("token {token_id}")))
    }

    /// Metadata id whose off-chain reference equals `reference`
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::NotFound` when no metadata has that reference,
    /// or any transport or GraphQL error.
    #[instrument(skip(self))]
    pub async fn metadata_id_by_reference(&self, reference: &str) -> Result<String, IndexerError> {
        let data: MetadataData = self
            .query(
                METADATA_BY_REFERENCE_QUERY,
                json!({ "reference": reference }),
            )
            .await?;

        data.nft_metadata
            .into_iter()
            .next()
            .map(|metadata| metadata.id)
            .ok_or_else(|| IndexerError::NotFound(format!("metadata for reference {reference}")))
    }

    /// Run a GraphQL query and decode its `data` field
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, IndexerError> {
        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client
                .post(self.config.endpoint.clone())
                .header(INDEXER_API_KEY_HEADER, self.config.api_key.as_str())
                .json(&json!({ "query": query, "variables": variables }))
                .send(),
        )
        .await
        .map_err(|_| IndexerError::Timeout {
            seconds: self.config.timeout_seconds,
        })??;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("indexer rejected the API key");
                return Err(IndexerError::Unauthorized);
            }
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                error!(status = status.as_u16(), %message, "indexer query failed");
                return Err(IndexerError::ApiError {
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let body: GraphQlResponse<T> = serde_json::from_str(&response.text().await?)?;

        if !body.errors.is_empty() {
            let messages = body
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            error!(errors = %messages, "indexer returned GraphQL errors");
            return Err(IndexerError::GraphQl(messages));
        }

        debug!("indexer query succeeded");
        body.data
            .ok_or_else(|| IndexerError::GraphQl("response has no data".to_string()))
    }
}

impl ApiClient for IndexerClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let response = timeout(
            Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECONDS),
            self.client
                .post(self.config.endpoint.clone())
                .header(INDEXER_API_KEY_HEADER, self.config.api_key.as_str())
                .json(&json!({ "query": HEALTH_QUERY }))
                .send(),
        )
        .await;

        Ok(match response {
            Ok(Ok(response)) => HealthStatus::from_probe_status(response.status().as_u16()),
            Ok(Err(e)) => HealthStatus::unreachable(e),
            Err(_) => HealthStatus::Degraded {
                reason: "health check timed out".to_string(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "mintbase-indexer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_envelope_with_errors() {
        let body = r#"{"data":null,"errors":[{"message":"field not found"}]}"#;
        let parsed: GraphQlResponse<TokensData> = serde_json::from_str(body).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors[0].message, "field not found");
    }

    #[test]
    fn graphql_envelope_without_errors() {
        let body = r#"{"data":{"nft_tokens":[{"metadata_id":"nft.testnet:abc"}]}}"#;
        let parsed: GraphQlResponse<TokensData> = serde_json::from_str(body).unwrap();
        assert!(parsed.errors.is_empty());
        let data = parsed.data.unwrap();
        assert_eq!(
            data.nft_tokens[0].metadata_id.as_deref(),
            Some("nft.testnet:abc")
        );
    }

    #[test]
    fn queries_use_variables() {
        assert!(TOKEN_METADATA_QUERY.contains("$tokenId"));
        assert!(TOKEN_METADATA_QUERY.contains("$contractId"));
        assert!(METADATA_BY_REFERENCE_QUERY.contains("$reference"));
    }
}
