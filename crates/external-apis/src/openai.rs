// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! OpenAI image generation client
//!
//! Turns a text prompt into a hosted image URL through the
//! `images/generations` endpoint. Only URL responses are requested; the image
//! bytes are fetched later by the resize service.

use std::time::{Duration, Instant};

use api_client::{ApiClient, ApiError, GeneratedImage, HealthStatus};
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::{NonEmptyString, USER_AGENT, join_path};

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default image model
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
/// Default image size
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
/// Default image style
pub const DEFAULT_IMAGE_STYLE: &str = "vivid";

const DEFAULT_OPENAI_TIMEOUT_SECONDS: u64 = 60;
const HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;

/// Configuration for the OpenAI image client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL, e.g. `https://api.openai.com/v1`
    pub base_url: Url,
    /// Secret API key
    pub api_key: NonEmptyString,
    /// Image model name
    pub model: NonEmptyString,
    /// Requested image size, e.g. `1024x1024`
    pub size: NonEmptyString,
    /// Image style; omitted from the request when `None`
    pub style: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl OpenAiConfig {
    /// Configuration against the public API with default model, size and style
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::Config` if the API key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenAiError> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_OPENAI_BASE_URL)
                .map_err(|e| OpenAiError::Config(e.to_string()))?,
            api_key: NonEmptyString::new(api_key).map_err(OpenAiError::Config)?,
            model: NonEmptyString::new(DEFAULT_IMAGE_MODEL).map_err(OpenAiError::Config)?,
            size: NonEmptyString::new(DEFAULT_IMAGE_SIZE).map_err(OpenAiError::Config)?,
            style: Some(DEFAULT_IMAGE_STYLE.to_string()),
            timeout_seconds: DEFAULT_OPENAI_TIMEOUT_SECONDS,
        })
    }

    /// Point the client at a different API base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Errors specific to the OpenAI image client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum OpenAiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// The prompt was refused, usually by the content policy
    #[error("Prompt rejected: {message}")]
    Rejected { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Authentication failed
    #[error("Authentication failed")]
    Unauthorized,

    /// Response did not contain a usable image URL
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<OpenAiError> for ApiError {
    fn from(value: OpenAiError) -> Self {
        match value {
            OpenAiError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            OpenAiError::Json(error) => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            OpenAiError::InvalidResponse(message) => ApiError::InvalidResponse { message },
            OpenAiError::ApiError { status, message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            OpenAiError::Rejected { message } => ApiError::Custom {
                error: anyhow::Error::msg(format!("prompt rejected: {message}")),
            },
            OpenAiError::RateLimited => ApiError::RateLimitExceeded {
                retry_after_seconds: 60,
            },
            OpenAiError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            OpenAiError::Config(message) => ApiError::Configuration { message },
            OpenAiError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

/// Body of an `images/generations` request
#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    response_format: &'static str,
}

/// Response of an `images/generations` request
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    revised_prompt: Option<String>,
}

/// OpenAI API error envelope
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
    r#type: Option<String>,
    code: Option<String>,
}

/// OpenAI image generation client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::Config` if the API key cannot be used as a header
    /// value, or `OpenAiError::Http` if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| OpenAiError::Config(format!("invalid API key format: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            timeout_seconds = config.timeout_seconds,
            "created OpenAI image client"
        );

        Ok(Self { client, config })
    }

    /// Client configuration
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Generate one image for `prompt` and return its hosted URL
    ///
    /// # Errors
    ///
    /// Returns an `OpenAiError` if the request fails, times out, is rejected,
    /// or the response carries no valid image URL.
    #[instrument(skip(self, prompt), fields(model = %self.config.model, size = %self.config.size))]
    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, OpenAiError> {
        let url = join_path(&self.config.base_url, "images/generations")
            .map_err(|e| OpenAiError::Config(format!("invalid base URL: {e}")))?;

        let request = ImageGenerationRequest {
            model: self.config.model.as_str(),
            prompt,
            n: 1,
            size: self.config.size.as_str(),
            style: self.config.style.as_deref().filter(|s| !s.is_empty()),
            response_format: "url",
        };

        debug!(prompt_length = prompt.len(), "requesting image generation");

        let start_time = Instant::now();
        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.post(url).json(&request).send(),
        )
        .await
        .map_err(|_| OpenAiError::Timeout {
            seconds: self.config.timeout_seconds,
        })??;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            status = status.as_u16(),
            duration_ms = start_time.elapsed().as_millis(),
            "image generation request completed"
        );

        if !status.is_success() {
            return Err(Self::handle_error_response(status, &body));
        }

        let images: ImagesResponse = serde_json::from_str(&body)?;
        let image = images
            .data
            .into_iter()
            .find(|image| image.url.is_some())
            .ok_or_else(|| OpenAiError::InvalidResponse("no image URL in response".to_string()))?;

        let raw_url = image.url.unwrap_or_default();
        let url = Url::parse(&raw_url)
            .map_err(|e| OpenAiError::InvalidResponse(format!("malformed image URL: {e}")))?;

        info!(image_host = url.host_str().unwrap_or_default(), "image generated");

        Ok(GeneratedImage {
            url,
            revised_prompt: image.revised_prompt,
        })
    }

    /// Map a non-success answer onto an error, preferring the API's own message
    fn handle_error_response(status: StatusCode, body: &str) -> OpenAiError {
        let message = match serde_json::from_str::<OpenAiErrorResponse>(body) {
            Ok(parsed) => format!(
                "{} (type: {:?}, code: {:?})",
                parsed.error.message, parsed.error.r#type, parsed.error.code
            ),
            Err(_) => body.to_string(),
        };

        error!(status = status.as_u16(), %message, "OpenAI API returned an error");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OpenAiError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => OpenAiError::RateLimited,
            StatusCode::BAD_REQUEST => OpenAiError::Rejected { message },
            status => OpenAiError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl ApiClient for OpenAiClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = join_path(&self.config.base_url, "models").map_err(|e| {
            ApiError::Configuration {
                message: format!("invalid base URL: {e}"),
            }
        })?;

        debug!(%url, "performing health check on OpenAI API");

        let response = timeout(
            Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECONDS),
            self.client.get(url).send(),
        )
        .await;

        Ok(match response {
            Ok(Ok(response)) => {
                let status = HealthStatus::from_probe_status(response.status().as_u16());
                if !status.is_available() {
                    warn!(reason = status.description(), "OpenAI API health check failed");
                }
                status
            }
            Ok(Err(e)) => HealthStatus::unreachable(e),
            Err(_) => HealthStatus::Degraded {
                reason: "health check timed out".to_string(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
