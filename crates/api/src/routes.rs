// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the mint gateway.

pub mod handlers;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use handlers::{
    generate_image_handler, health_handler, mint_handler, token_by_reference_handler,
    token_link_handler, verify_license_handler,
};
use tower_http::timeout::TimeoutLayer;

use crate::{
    docs::{OPENAPI_JSON_PATH, openapi_spec, swagger_ui},
    metrics::metrics_handler,
    middleware::{cors_method_gate, license_gate, record_request, request_deadline},
    state::ServerState,
};

/// Create application routes
///
/// Gateway endpoints share the CORS and method gate. `/generate-image` and
/// `/mint` additionally pass the license gate when it is enabled.
pub fn create_routes(state: &ServerState) -> Router<ServerState> {
    let deadline = state.config().timeout_seconds.value();

    // Monitoring and documentation bypass the gates
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(OPENAPI_JSON_PATH, get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui))
        .layer(TimeoutLayer::new(deadline));

    let mut licensed_routes = Router::new()
        .route("/generate-image", post(generate_image_handler))
        .route("/mint", post(mint_handler));

    if state.config().license_gate.enabled {
        licensed_routes = licensed_routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            license_gate,
        ));
    }

    let open_routes = Router::new()
        .route("/get-token-link", post(token_link_handler))
        .route(
            "/get-token-url-by-reference",
            post(token_by_reference_handler),
        )
        .route("/verify-license", post(verify_license_handler));

    // `layer` rather than `route_layer` so OPTIONS and other methods reach the gate
    let gateway_routes = Router::new()
        .merge(licensed_routes)
        .merge(open_routes)
        .layer(middleware::from_fn_with_state(state.clone(), request_deadline))
        .layer(middleware::from_fn(cors_method_gate))
        .layer(middleware::from_fn(record_request));

    Router::new().merge(ops_routes).merge(gateway_routes)
}
