// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the mint gateway,
//! including configuration, the outbound client registry, and coordinated
//! cancellation.

use std::{collections::HashMap, sync::Arc};

use external_apis::ServiceRegistry;
use serde::{Deserialize, Serialize};
use shared_types::Network;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::{
    config::{Environment, ServerConfig},
    error::ServerResult,
};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Outbound clients shared by every request
    registry: Arc<ServiceRegistry>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: ServerConfig,
        registry: Arc<ServiceRegistry>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Outbound client registry
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Perform health check operations
    pub async fn health_check(&self) -> ServerResult<HealthCheck> {
        let statuses = self.registry.get_overall_health().await;
        let status = overall_status(&statuses);

        let api_clients: HashMap<String, HealthStatus> = statuses
            .into_iter()
            .map(|(name, status)| (name, HealthStatus::from(status)))
            .collect();

        Ok(HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            network: self.config.network,
            timestamp: chrono::Utc::now().to_rfc3339(),
            api_clients,
        })
    }
}

/// Health status of a service or dependency
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not operational or has critical failures
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Service is operational but experiencing performance issues or partial failures
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

impl From<api_client::HealthStatus> for HealthStatus {
    fn from(status: api_client::HealthStatus) -> Self {
        match status {
            api_client::HealthStatus::Up => HealthStatus::Up,
            api_client::HealthStatus::Degraded { reason } => HealthStatus::Degraded {
                reason: reason.into_boxed_str(),
            },
            api_client::HealthStatus::Down { reason } => HealthStatus::Down {
                reason: reason.into_boxed_str(),
            },
        }
    }
}

/// Up when every client is up; otherwise degraded, naming the clients that are down
fn overall_status(statuses: &HashMap<String, api_client::HealthStatus>) -> HealthStatus {
    if statuses
        .values()
        .all(|status| *status == api_client::HealthStatus::Up)
    {
        return HealthStatus::Up;
    }

    if statuses.values().all(api_client::HealthStatus::is_available) {
        return HealthStatus::Degraded {
            reason: Box::from("one or more API clients are degraded"),
        };
    }

    let mut down: Vec<&str> = statuses
        .iter()
        .filter(|(_, status)| status.is_down())
        .map(|(name, _)| name.as_str())
        .collect();
    down.sort_unstable();
    HealthStatus::Degraded {
        reason: format!("unavailable API clients: {}", down.join(", ")).into_boxed_str(),
    }
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Active NEAR network
    pub network: Network,
    /// Timestamp
    pub timestamp: String,
    /// Status of individual API clients
    #[schema(value_type = Object)]
    pub api_clients: HashMap<String, HealthStatus>,
}
