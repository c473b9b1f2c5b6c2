// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct for the mint gateway,
//! including construction of the outbound clients, router configuration, and
//! coordinated graceful shutdown using `CancellationToken`.

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, http::HeaderName};
use external_apis::{
    ArweaveClient, ArweaveConfig, FirestoreConfig, FirestoreLicenseStore, IndexerClient,
    IndexerConfig, LicenseVerificationClient, LicenseVerificationConfig, MintbaseLinks,
    NonEmptyString, OpenAiClient, OpenAiConfig, ResizeClient, ResizeConfig, ServiceRegistry,
    WalletConfig,
};
use hyper::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

// Server constants
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time to wait for graceful shutdown before forcing termination
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

fn config_error(client: &str, error: impl std::fmt::Display) -> ServerError {
    ServerError::Config {
        message: format!("{client}: {error}"),
    }
}

fn required(field: &str, value: &str) -> ServerResult<NonEmptyString> {
    NonEmptyString::new(value).map_err(|e| config_error(field, e))
}

/// Build every outbound client from the server configuration
///
/// Clients of the active network are selected here; requests never choose a
/// network themselves.
///
/// # Errors
///
/// Returns `ServerError::Config` if a credential or identifier is missing or a
/// client cannot be built.
pub fn create_service_registry(config: &ServerConfig) -> ServerResult<ServiceRegistry> {
    let apis = &config.external_apis;
    let network = config.active_network();

    let openai = {
        let settings = &apis.openai;
        let mut openai_config = OpenAiConfig::new(settings.api_key.as_str())
            .map_err(|e| config_error("openai", e))?
            .with_base_url(settings.base_url.clone());
        openai_config.model = required("openai.image_model", &settings.image_model)?;
        openai_config.size = required("openai.image_size", &settings.image_size)?;
        openai_config.style = Some(settings.image_style.clone()).filter(|s| !s.trim().is_empty());
        openai_config.timeout_seconds = settings.timeout_seconds.as_secs();
        OpenAiClient::new(openai_config).map_err(|e| config_error("openai", e))?
    };

    let resize = {
        let mut resize_config = ResizeConfig::new(apis.resize.url.clone());
        resize_config.timeout_seconds = apis.resize.timeout_seconds.as_secs();
        ResizeClient::new(resize_config).map_err(|e| config_error("resize", e))?
    };

    let arweave = {
        let mut arweave_config =
            ArweaveConfig::new(apis.arweave.upload_url.clone(), apis.arweave.api_key.as_str())
                .map_err(|e| config_error("arweave", e))?;
        arweave_config.file_name = required("mint.media_file_name", &config.mint.media_file_name)?;
        arweave_config.timeout_seconds = apis.arweave.timeout_seconds.as_secs();
        ArweaveClient::new(arweave_config).map_err(|e| config_error("arweave", e))?
    };

    let indexer = {
        let mut indexer_config =
            IndexerConfig::new(network.indexer_url.clone(), apis.indexer.api_key.as_str())
                .map_err(|e| config_error("indexer", e))?;
        indexer_config.timeout_seconds = apis.indexer.timeout_seconds.as_secs();
        IndexerClient::new(indexer_config).map_err(|e| config_error("indexer", e))?
    };

    let licenses = {
        let settings = &apis.firestore;
        let mut firestore_config =
            FirestoreConfig::new(settings.project_id.as_str(), settings.api_key.as_str())
                .map_err(|e| config_error("firestore", e))?
                .with_base_url(settings.base_url.clone());
        firestore_config.collection = required("firestore.collection", &settings.collection)?;
        firestore_config.timeout_seconds = settings.timeout_seconds.as_secs();
        FirestoreLicenseStore::new(firestore_config).map_err(|e| config_error("firestore", e))?
    };

    let links = MintbaseLinks::new(WalletConfig {
        wallet_url: network.wallet_url.clone(),
        marketplace_url: network.marketplace_url.clone(),
        minter: required("networks.minter", &network.minter)?,
        nft_contract: required("networks.nft_contract", &network.nft_contract)?,
        gas: config.mint.gas.clone(),
        deposit: config.mint.deposit.clone(),
    })
    .map_err(|e| config_error("mint", e))?;

    let registry = ServiceRegistry::new(openai, resize, arweave, indexer, licenses, links);

    if !config.license_gate.enabled {
        return Ok(registry);
    }

    let mut verifier_config =
        LicenseVerificationConfig::new(apis.license_verification.url.clone());
    verifier_config.timeout_seconds = apis.license_verification.timeout_seconds.as_secs();
    let verifier = LicenseVerificationClient::new(verifier_config)
        .map_err(|e| config_error("license_verification", e))?;

    Ok(registry.with_license_verifier(verifier))
}

impl Server {
    /// Create new server instance
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let registry = create_service_registry(&config)?;
        info!(
            network = %config.network,
            clients = ?registry.client_names(),
            license_gate = config.license_gate.enabled,
            "service registry ready"
        );
        Self::with_registry(config, shutdown_config, Arc::new(registry))
    }

    /// Create server with a prepared registry
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn with_registry(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        registry: Arc<ServiceRegistry>,
    ) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), registry, cancellation_token.child_token());
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, method = %req.method(), path = req.uri().path())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER));

        create_routes(&state).layer(middleware).with_state(state)
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// or `ServerError::Startup` if the server fails to start.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            network = %self.config.network,
            "mint gateway starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let graceful_timeout = self.graceful_shutdown_config.graceful_timeout;
        let server = axum::serve(listener, self.router).with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            info!("mint gateway stopped accepting connections");
        })
        .into_future();

        let server_result = tokio::select! {
            result = server => result,
            () = Self::drain_deadline(self.cancellation_token.clone(), graceful_timeout) => {
                warn!(?graceful_timeout, "graceful shutdown timed out, dropping open connections");
                Ok(())
            }
        };

        if let Err(e) = server_result {
            error!(error = ?e, "Server error during shutdown");
            Err(ServerError::Shutdown { source: e })
        } else {
            info!("mint gateway shut down");
            Ok(())
        }
    }

    /// Resolves `graceful_timeout` after cancellation
    async fn drain_deadline(token: CancellationToken, graceful_timeout: Duration) {
        token.cancelled().await;
        tokio::time::sleep(graceful_timeout).await;
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// This function listens for SIGINT (Ctrl+C) and SIGTERM signals,
    /// and cancels the provided cancellation token when received.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => {
                        warn!("Received SIGTERM signal, initiating coordinated shutdown");
                        "SIGTERM"
                    },
                    _ = sigint.recv() => {
                        warn!("Received SIGINT signal, initiating coordinated shutdown");
                        "SIGINT"
                    },
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                warn!("Received CTRL+C signal, initiating coordinated shutdown");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!("Shutdown signal {} received, cancelling all operations...", signal_name);
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                warn!("Cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let addr = self.config.socket_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}
