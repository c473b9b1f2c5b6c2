// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! License verification client
//!
//! Asks a `verify-license` endpoint whether a license key may be used from a
//! domain. Any 2xx answer counts as verified, any 4xx as refused. Server
//! errors and transport failures are reported as errors so the caller can
//! log them before refusing.

use std::time::Duration;

use api_client::{ApiClient, ApiError, HealthStatus};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::USER_AGENT;

const DEFAULT_VERIFY_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for the license verification client
#[derive(Debug, Clone)]
pub struct LicenseVerificationConfig {
    /// URL of the verification endpoint
    pub endpoint: Url,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl LicenseVerificationConfig {
    /// Configuration with the default timeout
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout_seconds: DEFAULT_VERIFY_TIMEOUT_SECONDS,
        }
    }
}

/// Errors specific to license verification
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum LicenseVerificationError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Verification endpoint failed
    #[error("verification endpoint error: {status}")]
    ServerError { status: u16 },

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<LicenseVerificationError> for ApiError {
    fn from(value: LicenseVerificationError) -> Self {
        match value {
            LicenseVerificationError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            LicenseVerificationError::ServerError { .. } => ApiError::ServiceUnavailable {
                message: value.to_string(),
            },
            LicenseVerificationError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    license_key: &'a str,
    domain: &'a str,
}

/// License verification client
#[derive(Debug, Clone)]
pub struct LicenseVerificationClient {
    client: Client,
    config: LicenseVerificationConfig,
}

impl LicenseVerificationClient {
    /// Create a new verification client
    ///
    /// # Errors
    ///
    /// Returns `LicenseVerificationError::Http` if the HTTP client cannot be built.
    pub fn new(config: LicenseVerificationConfig) -> Result<Self, LicenseVerificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Whether `license_key` is valid for `domain`
    ///
    /// # Errors
    ///
    /// Returns a `LicenseVerificationError` on transport failures, timeouts
    /// and 5xx answers.
    #[instrument(skip(self, license_key))]
    pub async fn verify(
        &self,
        license_key: &str,
        domain: &str,
    ) -> Result<bool, LicenseVerificationError> {
        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client
                .post(self.config.endpoint.clone())
                .json(&VerifyRequest {
                    license_key,
                    domain,
                })
                .send(),
        )
        .await
        .map_err(|_| LicenseVerificationError::Timeout {
            seconds: self.config.timeout_seconds,
        })??;

        let status = response.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "license verification endpoint failed");
            return Err(LicenseVerificationError::ServerError {
                status: status.as_u16(),
            });
        }

        debug!(status = status.as_u16(), "license verification answered");
        Ok(status.is_success())
    }
}

impl ApiClient for LicenseVerificationClient {
    /// The endpoint only accepts real license checks
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus::Up)
    }

    fn name(&self) -> &'static str {
        "license-verification"
    }
}
