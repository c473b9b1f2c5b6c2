// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::{sync::LazyLock, time::Instant};

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use tracing::error;

/// Total number of gateway requests, labeled by endpoint and status code.
pub static REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "nft_mint_gateway_requests_total",
        "Total number of gateway requests, labeled by endpoint and status",
        &["endpoint", "status"]
    )
    .expect("Failed to create nft_mint_gateway_requests_total counter vec")
});

/// Histogram for outbound request durations in seconds.
pub static UPSTREAM_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "nft_mint_gateway_upstream_request_duration",
        "Outbound request durations in seconds",
        &["api_name", "result"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to create upstream request duration histogram")
});

/// Increment the request counter
pub fn inc_requests(endpoint: &str, status: StatusCode) {
    REQUESTS
        .with_label_values(&[endpoint, status.as_str()])
        .inc();
}

/// Observe the duration of an outbound request
///
/// # Arguments
/// * `api_name` - Name of the outbound client
/// * `result` - `success` or `error`
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_upstream_duration(api_name: &str, result: &str, duration_secs: f64) {
    UPSTREAM_REQUEST_DURATION
        .with_label_values(&[api_name, result])
        .observe(duration_secs);
}

/// Await an outbound call and record its duration under `api_name`
pub async fn track_upstream<T, E>(
    api_name: &'static str,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let started = Instant::now();
    let result = call.await;
    let outcome = if result.is_ok() { "success" } else { "error" };
    observe_upstream_duration(api_name, outcome, started.elapsed().as_secs_f64());
    result
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
