// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Firestore-backed license store
//!
//! License records live in a Firestore collection keyed by license key. The
//! store reads single documents through the Firestore REST API and converts
//! the typed field encoding into a [`LicenseRecord`].

use std::time::Duration;

use api_client::{ApiClient, ApiError, HealthStatus};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared_types::LicenseRecord;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::{NonEmptyString, USER_AGENT};

/// Default Firestore REST API base URL
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
/// Default collection holding license documents
pub const DEFAULT_LICENSE_COLLECTION: &str = "licenses";

const DEFAULT_FIRESTORE_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for the Firestore license store
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// REST API base URL
    pub base_url: Url,
    /// Google Cloud project id
    pub project_id: NonEmptyString,
    /// Web API key
    pub api_key: NonEmptyString,
    /// Collection holding license documents
    pub collection: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl FirestoreConfig {
    /// Create a validated configuration against the public Firestore endpoint
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Config` if the project id or API key is blank.
    pub fn new(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, FirestoreError> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_FIRESTORE_BASE_URL)
                .map_err(|e| FirestoreError::Config(e.to_string()))?,
            project_id: NonEmptyString::new(project_id).map_err(FirestoreError::Config)?,
            api_key: NonEmptyString::new(api_key).map_err(FirestoreError::Config)?,
            collection: NonEmptyString::new(DEFAULT_LICENSE_COLLECTION)
                .map_err(FirestoreError::Config)?,
            timeout_seconds: DEFAULT_FIRESTORE_TIMEOUT_SECONDS,
        })
    }

    /// Point the store at a different REST endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Errors specific to the Firestore license store
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum FirestoreError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Firestore returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

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

impl From<FirestoreError> for ApiError {
    fn from(value: FirestoreError) -> Self {
        match value {
            FirestoreError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            FirestoreError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            FirestoreError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            FirestoreError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            FirestoreError::Config(message) => ApiError::Configuration { message },
            FirestoreError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

/// A Firestore document with the fields of a license
#[derive(Debug, Deserialize)]
struct LicenseDocument {
    #[serde(default)]
    fields: LicenseFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseFields {
    is_active: Option<BooleanValue>,
    domains: Option<ArrayValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BooleanValue {
    boolean_value: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrayValue {
    array_value: ArrayValues,
}

#[derive(Debug, Default, Deserialize)]
struct ArrayValues {
    #[serde(default)]
    values: Vec<StringValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StringValue {
    string_value: Option<String>,
}

impl LicenseDocument {
    fn into_record(self, key: &str) -> LicenseRecord {
        LicenseRecord {
            key: key.to_string(),
            is_active: self.fields.is_active.is_some_and(|v| v.boolean_value),
            domains: self
                .fields
                .domains
                .map(|d| d.array_value.values)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|v| v.string_value)
                .collect(),
        }
    }
}

/// Read-only license store backed by Firestore
#[derive(Debug, Clone)]
pub struct FirestoreLicenseStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreLicenseStore {
    /// Create a new license store
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Http` if the HTTP client cannot be built.
    pub fn new(config: FirestoreConfig) -> Result<Self, FirestoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Document URL of license `key`
    fn document_url(&self, key: &str) -> Result<Url, FirestoreError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FirestoreError::Config("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend([
                "projects",
                self.config.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                self.config.collection.as_str(),
                key,
            ]);
        url.query_pairs_mut()
            .append_pair("key", self.config.api_key.as_str());
        Ok(url)
    }

    /// Fetch the license stored under `key`
    ///
    /// Returns `Ok(None)` if no such license exists.
    ///
    /// # Errors
    ///
    /// Returns a `FirestoreError` on transport failures, rejected credentials
    /// or malformed documents.
    #[instrument(skip(self, key))]
    pub async fn get_license(&self, key: &str) -> Result<Option<LicenseRecord>, FirestoreError> {
        let url = self.document_url(key)?;

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.get(url).send(),
        )
        .await
        .map_err(|_| FirestoreError::Timeout {
            seconds: self.config.timeout_seconds,
        })??;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("license document does not exist");
                Ok(None)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Firestore rejected the API key");
                Err(FirestoreError::Unauthorized)
            }
            status if status.is_success() => {
                let document: LicenseDocument = serde_json::from_str(&response.text().await?)?;
                Ok(Some(document.into_record(key)))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                error!(status = status.as_u16(), %message, "Firestore lookup failed");
                Err(FirestoreError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl ApiClient for FirestoreLicenseStore {
    /// Probing would need a real license key, so only configuration is checked
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}
