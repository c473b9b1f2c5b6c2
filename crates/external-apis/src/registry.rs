// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Registry of the outbound collaborators
//!
//! The registry is built once at startup and shared read-only by every
//! request. It owns one client per collaborator and reports their health.

use std::collections::HashMap;

use api_client::{ApiClient, ApiError, HealthStatus};
use tracing::{debug, warn};

use crate::{
    ArweaveClient, FirestoreLicenseStore, IndexerClient, LicenseVerificationClient, MintbaseLinks,
    OpenAiClient, ResizeClient,
};

/// Registry holding every outbound client of the gateway
#[derive(Debug)]
pub struct ServiceRegistry {
    openai: OpenAiClient,
    resize: ResizeClient,
    arweave: ArweaveClient,
    indexer: IndexerClient,
    licenses: FirestoreLicenseStore,
    links: MintbaseLinks,
    license_verifier: Option<LicenseVerificationClient>,
}

impl ServiceRegistry {
    /// Create a registry from its clients; license verification is added separately
    pub fn new(
        openai: OpenAiClient,
        resize: ResizeClient,
        arweave: ArweaveClient,
        indexer: IndexerClient,
        licenses: FirestoreLicenseStore,
        links: MintbaseLinks,
    ) -> Self {
        Self {
            openai,
            resize,
            arweave,
            indexer,
            licenses,
            links,
            license_verifier: None,
        }
    }

    /// Attach the client used by the license gate
    #[must_use]
    pub fn with_license_verifier(mut self, verifier: LicenseVerificationClient) -> Self {
        self.license_verifier = Some(verifier);
        self
    }

    /// Image generation client
    pub fn openai(&self) -> &OpenAiClient {
        &self.openai
    }

    /// Resize service client
    pub fn resize(&self) -> &ResizeClient {
        &self.resize
    }

    /// Media upload client
    pub fn arweave(&self) -> &ArweaveClient {
        &self.arweave
    }

    /// Token indexer client
    pub fn indexer(&self) -> &IndexerClient {
        &self.indexer
    }

    /// License store
    pub fn licenses(&self) -> &FirestoreLicenseStore {
        &self.licenses
    }

    /// Wallet and marketplace link builder
    pub fn links(&self) -> &MintbaseLinks {
        &self.links
    }

    /// License verification client, present when the license gate is enabled
    pub fn license_verifier(&self) -> Option<&LicenseVerificationClient> {
        self.license_verifier.as_ref()
    }

    /// Names of all registered clients
    pub fn client_names(&self) -> Vec<&'static str> {
        let mut names = vec![
            self.openai.name(),
            self.resize.name(),
            self.arweave.name(),
            self.indexer.name(),
            self.licenses.name(),
        ];
        if let Some(verifier) = &self.license_verifier {
            names.push(verifier.name());
        }
        names
    }

    /// Number of registered clients
    pub fn client_count(&self) -> usize {
        self.client_names().len()
    }

    /// Health of every client, probed concurrently
    pub async fn get_overall_health(&self) -> HashMap<String, HealthStatus> {
        let verifier_health = async {
            match &self.license_verifier {
                Some(verifier) => Some((verifier.name(), verifier.health_check().await)),
                None => None,
            }
        };

        let (openai, resize, arweave, indexer, licenses, verifier) = tokio::join!(
            self.openai.health_check(),
            self.resize.health_check(),
            self.arweave.health_check(),
            self.indexer.health_check(),
            self.licenses.health_check(),
            verifier_health,
        );

        let mut results = vec![
            (self.openai.name(), openai),
            (self.resize.name(), resize),
            (self.arweave.name(), arweave),
            (self.indexer.name(), indexer),
            (self.licenses.name(), licenses),
        ];
        results.extend(verifier);

        results
            .into_iter()
            .map(|(name, result)| (name.to_string(), Self::status_or_down(name, result)))
            .collect()
    }

    fn status_or_down(name: &str, result: Result<HealthStatus, ApiError>) -> HealthStatus {
        match result {
            Ok(status) => {
                debug!(client = name, status = status.description(), "health check finished");
                status
            }
            Err(e) => {
                warn!(client = name, error = %e, "health check failed");
                HealthStatus::Down {
                    reason: e.to_string(),
                }
            }
        }
    }
}
