// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! Every gateway endpoint sits behind the same gates:
//!
//! - [`cors_method_gate`] answers CORS preflight, rejects methods other than
//!   POST and marks every response as readable from any origin
//! - [`license_gate`] requires a license key that the verification endpoint
//!   accepts for the caller's origin
//! - [`request_deadline`] bounds a whole request and answers the endpoint's
//!   own 500 when it expires
//! - [`record_request`] counts requests per endpoint and status

use api_client::{ApiClient, ApiError};
use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::domain_from_origin;
use tracing::{debug, error, warn};

use crate::{
    error::ServerError, metrics, routes::handlers::failure_message, state::ServerState,
};

/// Header carrying the caller's license key
pub const LICENSE_KEY_HEADER: HeaderName = HeaderName::from_static("x-license-key");

const ALLOWED_METHODS: HeaderValue = HeaderValue::from_static("POST, OPTIONS");
const ALLOWED_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type, X-License-Key");
const ANY_ORIGIN: HeaderValue = HeaderValue::from_static("*");
const POST_ONLY: HeaderValue = HeaderValue::from_static("POST");

/// CORS and method gate for gateway endpoints
///
/// - `OPTIONS`: 200 with an empty body and the preflight headers
/// - `POST`: passed through
/// - anything else: 405 `Method <METHOD> Not Allowed` with `Allow: POST`
///
/// `Access-Control-Allow-Origin: *` is set on every response.
pub async fn cors_method_gate(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let mut response = match method {
        Method::POST => next.run(req).await,
        Method::OPTIONS => preflight_response(),
        method => {
            debug!(%method, path = req.uri().path(), "method not allowed");
            method_not_allowed(&method)
        }
    };

    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, ANY_ORIGIN);
    response
}

fn preflight_response() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
        ],
        Body::empty(),
    )
        .into_response()
}

fn method_not_allowed(method: &Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, POST_ONLY)],
        format!("Method {method} Not Allowed"),
    )
        .into_response()
}

/// License key of the request, if present and not blank
fn license_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LICENSE_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
}

/// Caller domain: the `Origin` header without its scheme, if present and not blank
fn caller_domain(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(domain_from_origin)
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(ToString::to_string)
}

/// License gate for gated endpoints
///
/// A missing key or origin, a refusal or a failed verification all answer
/// 403 `{"error": "Unauthorized", "status": 403}` before the handler runs.
/// When no verifier is registered the gate lets every request through.
pub async fn license_gate(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(verifier) = state.registry().license_verifier() else {
        return next.run(req).await;
    };

    let Some(key) = license_key(req.headers()) else {
        warn!(path = req.uri().path(), "request without license key");
        return ServerError::Unauthorized.into_response();
    };
    let Some(domain) = caller_domain(req.headers()) else {
        warn!(path = req.uri().path(), "licensed request without origin");
        return ServerError::Unauthorized.into_response();
    };

    let verification =
        metrics::track_upstream(verifier.name(), verifier.verify(&key, &domain)).await;

    match verification {
        Ok(true) => {
            debug!(%domain, "license verified");
            next.run(req).await
        }
        Ok(false) => {
            warn!(%domain, "license refused");
            ServerError::Unauthorized.into_response()
        }
        Err(e) => {
            error!(%domain, error = %e, "license verification failed");
            ServerError::Unauthorized.into_response()
        }
    }
}

/// Deadline for a whole gateway request
///
/// Runs inside the CORS gate, so an expired request still carries
/// `Access-Control-Allow-Origin` and the gateway's JSON error body.
pub async fn request_deadline(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Response {
    let deadline = state.config().timeout_seconds;
    let context = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| failure_message(req.uri().path()), |path| failure_message(path.as_str()));

    match tokio::time::timeout(deadline.value(), next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(?deadline, "request deadline expired");
            ServerError::upstream(
                context,
                ApiError::Timeout {
                    timeout_seconds: deadline.as_secs(),
                },
            )
            .into_response()
        }
    }
}

/// Count requests by matched route and response status
pub async fn record_request(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());

    let response = next.run(req).await;
    metrics::inc_requests(&endpoint, response.status());
    response
}
