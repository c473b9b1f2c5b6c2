// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides error types for server operations, including the
//! HTTP response mapping shared by every gateway endpoint.

use std::net::SocketAddr;

use api_client::ApiError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Input validation errors, returned to the caller verbatim
    #[error("{0}")]
    ValidationError(String),

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// License key missing or refused
    #[error("Unauthorized")]
    Unauthorized,

    /// Requested record does not exist
    #[error("{message}")]
    NotFound {
        /// Message returned to the caller
        message: String,
    },

    /// An outbound call failed; only `context` reaches the caller
    #[error("{context}")]
    Upstream {
        /// Handler-specific message returned to the caller
        context: &'static str,
        /// Underlying client error, logged server-side
        #[source]
        source: ApiError,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Wrap a client error with the message the caller should see
    pub fn upstream(context: &'static str, source: impl Into<ApiError>) -> Self {
        Self::Upstream {
            context,
            source: source.into(),
        }
    }

    /// HTTP status of this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::ValidationError(..) | ServerError::JsonError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Unauthorized => StatusCode::FORBIDDEN,
            ServerError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Config { .. }
            | ServerError::Bind { .. }
            | ServerError::Startup { .. }
            | ServerError::Shutdown { .. }
            | ServerError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ServerError::Upstream { context, source } = &self {
            if source.is_not_found() {
                warn!(error = %source, "{context}: upstream record missing");
            } else {
                error!(error = %source, "{context}");
            }
        }

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}
