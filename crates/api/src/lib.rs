// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! NFT Mint Gateway Server Implementation
//!
//! This crate provides the HTTP server of the mint gateway, built with Axum.
//! It turns text prompts into images, uploads images to permanent storage and
//! hands back wallet links that mint them as NEAR NFTs.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration with layered file and environment loading
//! - [`error`]: Error types and their `{"error", "status"}` responses
//! - [`state`]: Shared application state and aggregated health
//! - [`server`]: Client construction, server lifecycle and coordinated shutdown
//! - [`routes`]: Route configuration and gateway handlers
//! - [`middleware`]: CORS and method gate, license gate, request counting
//! - [`extractors`]: JSON body extraction with descriptive failures
//! - [`metrics`]: Prometheus counters and outbound call timings
//! - [`docs`]: `OpenAPI` document and Swagger UI
//!
//! # Key Features
//!
//! - **Outbound Clients**: Image generation, resizing, media upload, indexer and license
//!   store clients owned by one registry
//! - **License Gate**: Gated endpoints require a key accepted for the caller's origin
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken` with timeouts
//! - **Health Monitoring**: Aggregated health checks across all outbound clients

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig, create_service_registry};
pub use shared_types::Network;
pub use state::{HealthCheck, ServerState};
