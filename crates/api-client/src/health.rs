// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health check types and utilities for API clients

use serde::{Deserialize, Serialize};

/// Health status of an API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Service is healthy and operational
    Up,
    /// Service is degraded but still functional
    Degraded { reason: String },
    /// Service is down and not functional
    Down { reason: String },
}

impl HealthStatus {
    /// Check if this health status indicates the service is available
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Check if this health status indicates the service is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Service is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }

    /// Classify an HTTP probe answer
    ///
    /// 2xx is up, 401/403 means the credentials are rejected, 429 and 5xx
    /// count as degraded since the service still answers.
    pub fn from_probe_status(status: u16) -> Self {
        match status {
            200..=299 => HealthStatus::Up,
            401 | 403 => HealthStatus::Down {
                reason: format!("credentials rejected ({status})"),
            },
            429 => HealthStatus::Degraded {
                reason: "rate limited".to_string(),
            },
            _ => HealthStatus::Degraded {
                reason: format!("unexpected status {status}"),
            },
        }
    }

    /// Status for a client whose probe request failed outright
    pub fn unreachable(error: impl std::fmt::Display) -> Self {
        HealthStatus::Down {
            reason: format!("unreachable: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_availability() {
        assert!(HealthStatus::Up.is_available());
        assert!(
            HealthStatus::Degraded {
                reason: "slow".to_string()
            }
            .is_available()
        );
        assert!(
            !HealthStatus::Down {
                reason: "offline".to_string()
            }
            .is_available()
        );
    }

    #[test]
    fn probe_status_classification() {
        assert_eq!(HealthStatus::from_probe_status(200), HealthStatus::Up);
        assert_eq!(HealthStatus::from_probe_status(204), HealthStatus::Up);
        assert!(HealthStatus::from_probe_status(401).is_down());
        assert!(HealthStatus::from_probe_status(403).is_down());
        assert!(!HealthStatus::from_probe_status(429).is_down());
        assert!(HealthStatus::from_probe_status(503).is_available());
    }

    #[test]
    fn unreachable_is_down() {
        let status = HealthStatus::unreachable("connection refused");
        assert!(status.is_down());
        assert_eq!(status.description(), "unreachable: connection refused");
    }
}
