// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Image resize service client
//!
//! The resize service downloads an image by URL, scales it to the requested
//! width and returns it base64 encoded.

use std::time::Duration;

use api_client::{ApiClient, ApiError, HealthStatus, ResizedImage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, instrument};
use url::Url;

use crate::USER_AGENT;

const DEFAULT_RESIZE_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for the resize service client
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    /// Full URL of the resize endpoint
    pub endpoint: Url,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl ResizeConfig {
    /// Configuration with the default timeout
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout_seconds: DEFAULT_RESIZE_TIMEOUT_SECONDS,
        }
    }
}

/// Errors specific to the resize service client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ResizeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Service returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Service answered without image data
    #[error("resize service returned an empty image")]
    EmptyImage,

    /// Requested width is not usable
    #[error("invalid width: {0}")]
    InvalidWidth(u32),

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<ResizeError> for ApiError {
    fn from(value: ResizeError) -> Self {
        match value {
            ResizeError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            ResizeError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            ResizeError::EmptyImage => ApiError::InvalidResponse {
                message: value.to_string(),
            },
            ResizeError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            ResizeError::InvalidWidth(_) => ApiError::Configuration {
                message: value.to_string(),
            },
            ResizeError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResizeRequest<'a> {
    image_url: &'a str,
    width: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResizeResponse {
    #[serde(default)]
    base64_image: String,
}

/// Resize service client
#[derive(Debug, Clone)]
pub struct ResizeClient {
    client: Client,
    config: ResizeConfig,
}

impl ResizeClient {
    /// Create a new resize client
    ///
    /// # Errors
    ///
    /// Returns `ResizeError::Http` if the HTTP client cannot be built.
    pub fn new(config: ResizeConfig) -> Result<Self, ResizeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Resize the image at `image_url` to `width` pixels wide
    ///
    /// # Errors
    ///
    /// Returns a `ResizeError` if the width is zero, the service fails, or it
    /// returns no image data.
    #[instrument(skip(self, image_url))]
    pub async fn resize(&self, image_url: &str, width: u32) -> Result<ResizedImage, ResizeError> {
        if width == 0 {
            return Err(ResizeError::InvalidWidth(width));
        }

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client
                .post(self.config.endpoint.clone())
                .json(&ResizeRequest { image_url, width })
                .send(),
        )
        .await
        .map_err(|_| ResizeError::Timeout {
            seconds: self.config.timeout_seconds,
        })??;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), "resize service returned an error");
            return Err(ResizeError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let resized: ResizeResponse = serde_json::from_str(&body)?;
        if resized.base64_image.trim().is_empty() {
            return Err(ResizeError::EmptyImage);
        }

        debug!(encoded_length = resized.base64_image.len(), "image resized");

        Ok(ResizedImage {
            base64: resized.base64_image,
        })
    }
}

impl ApiClient for ResizeClient {
    /// The resize service exposes no probe endpoint; reachability shows up per request
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "resize"
    }
}
