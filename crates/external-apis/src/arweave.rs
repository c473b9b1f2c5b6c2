// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Arweave media upload client
//!
//! Uploads an image through the Mintbase Arweave upload endpoint. The
//! endpoint takes a multipart form with a single `media` file and answers
//! with the content id of the stored file.

use std::time::Duration;

use api_client::{ApiClient, ApiError, HealthStatus, UploadReceipt};
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{error, info, instrument};
use url::Url;

use crate::{NonEmptyString, USER_AGENT};

/// Header carrying the Mintbase API key
pub const MINTBASE_API_KEY_HEADER: &str = "Mb-Api-Key";
/// Multipart field holding the uploaded file
pub const MEDIA_FIELD: &str = "media";
/// File name reported for uploaded media
pub const DEFAULT_MEDIA_FILE_NAME: &str = "wooImage.png";

const PNG_MIME: &str = "image/png";
const DEFAULT_UPLOAD_TIMEOUT_SECONDS: u64 = 60;

/// Configuration for the Arweave upload client
#[derive(Debug, Clone)]
pub struct ArweaveConfig {
    /// Upload endpoint URL
    pub upload_url: Url,
    /// Mintbase API key
    pub api_key: NonEmptyString,
    /// File name sent with the upload
    pub file_name: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl ArweaveConfig {
    /// Create a validated configuration with the default file name and timeout
    ///
    /// # Errors
    ///
    /// Returns `ArweaveError::Config` if the API key is blank.
    pub fn new(upload_url: Url, api_key: impl Into<String>) -> Result<Self, ArweaveError> {
        Ok(Self {
            upload_url,
            api_key: NonEmptyString::new(api_key).map_err(ArweaveError::Config)?,
            file_name: NonEmptyString::new(DEFAULT_MEDIA_FILE_NAME)
                .map_err(ArweaveError::Config)?,
            timeout_seconds: DEFAULT_UPLOAD_TIMEOUT_SECONDS,
        })
    }
}

/// Errors specific to the Arweave upload client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ArweaveError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Upload endpoint returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed")]
    Unauthorized,

    /// Upload succeeded but no content id came back
    #[error("upload response is missing the content id")]
    MissingContentId,

    /// Nothing to upload
    #[error("refusing to upload an empty file")]
    EmptyMedia,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<ArweaveError> for ApiError {
    fn from(value: ArweaveError) -> Self {
        match value {
            ArweaveError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            ArweaveError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            ArweaveError::MissingContentId => ApiError::InvalidResponse {
                message: value.to_string(),
            },
            ArweaveError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            ArweaveError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            ArweaveError::EmptyMedia | ArweaveError::Config(_) => ApiError::Configuration {
                message: value.to_string(),
            },
            ArweaveError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: Option<String>,
}

/// Arweave upload client
#[derive(Debug, Clone)]
pub struct ArweaveClient {
    client: Client,
    config: ArweaveConfig,
}

impl ArweaveClient {
    /// Create a new upload client
    ///
    /// # Errors
    ///
    /// Returns `ArweaveError::Http` if the HTTP client cannot be built.
    pub fn new(config: ArweaveConfig) -> Result<Self, ArweaveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Upload PNG bytes and return the content id
    ///
    /// # Errors
    ///
    /// Returns an `ArweaveError` if the bytes are empty, the upload fails or
    /// the response carries no content id.
    #[instrument(skip(self, png), fields(bytes = png.len()))]
    pub async fn upload_png(&self, png: Vec<u8>) -> Result<UploadReceipt, ArweaveError> {
        if png.is_empty() {
            return Err(ArweaveError::EmptyMedia);
        }

        let part = Part::bytes(png)
            .file_name(self.config.file_name.to_string())
            .mime_str(PNG_MIME)?;
        let form = Form::new().part(MEDIA_FIELD, part);

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client
                .post(self.config.upload_url.clone())
                .header(MINTBASE_API_KEY_HEADER, self.config.api_key.as_str())
                .multipart(form)
                .send(),
        )
        .await
        .map_err(|_| ArweaveError::Timeout {
            seconds: self.config.timeout_seconds,
        })??;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Arweave upload rejected the API key");
                Err(ArweaveError::Unauthorized)
            }
            status if status.is_success() => {
                let body: UploadResponse = serde_json::from_str(&response.text().await?)?;
                let id = body
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(ArweaveError::MissingContentId)?;
                info!(content_id = %id, "media uploaded");
                Ok(UploadReceipt { id })
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                error!(status = status.as_u16(), %message, "Arweave upload failed");
                Err(ArweaveError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl ApiClient for ArweaveClient {
    /// Uploads are not idempotent, so there is nothing safe to probe
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "arweave"
    }
}
