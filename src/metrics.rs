/// Metrics and telemetry for ACOMPANY
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Logins and registrations
/// - Element access decisions
/// - Gallery mutations
/// - Account and session totals

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========== Account Metrics ==========

    /// Login attempts by outcome
    pub static ref LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "logins_total",
        "Total number of login attempts",
        &["outcome"]
    )
    .unwrap();

    /// Successful registrations
    pub static ref REGISTRATIONS_TOTAL: IntCounter = register_int_counter!(
        "registrations_total",
        "Total number of registered accounts"
    )
    .unwrap();

    /// Active sessions
    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of active sessions"
    )
    .unwrap();

    /// Total accounts
    pub static ref ACCOUNTS_TOTAL: IntGauge = register_int_gauge!(
        "accounts_total",
        "Total number of accounts"
    )
    .unwrap();

    // ========== Access Metrics ==========

    /// Element access checks by decision
    pub static ref ACCESS_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "access_decisions_total",
        "Total number of element access decisions",
        &["decision"]
    )
    .unwrap();

    // ========== Gallery Metrics ==========

    /// Gallery mutations by tier and operation
    pub static ref GALLERY_MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gallery_mutations_total",
        "Total number of gallery mutations",
        &["tier", "operation"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a login attempt
pub fn record_login(outcome: &str) {
    LOGINS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_registration() {
    REGISTRATIONS_TOTAL.inc();
}

pub fn record_access_decision(decision: &str) {
    ACCESS_DECISIONS_TOTAL.with_label_values(&[decision]).inc();
}

pub fn record_gallery_mutation(tier: &str, operation: &str) {
    GALLERY_MUTATIONS_TOTAL
        .with_label_values(&[tier, operation])
        .inc();
}

pub fn set_accounts(count: usize) {
    ACCOUNTS_TOTAL.set(count as i64);
}

pub fn set_active_sessions(count: usize) {
    SESSIONS_ACTIVE.set(count as i64);
}

/// Middleware recording every request under its route template
pub async fn track_http(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
