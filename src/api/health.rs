/// Health and metrics endpoints
///
/// Supports two kinds of probe:
/// - Liveness: the process answers at all
/// - Readiness: the store can be read
use crate::{context::AppContext, metrics, store::keys};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    /// "healthy" or "unhealthy"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(health_basic))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_endpoint))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe
///
/// Returns 503 when the store cannot be read.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> (StatusCode, Json<ComponentHealth>) {
    let check = check_store(&ctx).await;
    let status = if check.status == "healthy" {
        StatusCode::OK
    } else {
        tracing::warn!(error = ?check.error, "readiness_probe_failed: store check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(check))
}

async fn check_store(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();
    let result = ctx.store.get(keys::USERS).await;
    let response_time_ms = Some(start.elapsed().as_millis() as u64);

    match result {
        Ok(_) => ComponentHealth {
            name: "store".to_string(),
            status: "healthy".to_string(),
            response_time_ms,
            error: None,
        },
        Err(e) => ComponentHealth {
            name: "store".to_string(),
            status: "unhealthy".to_string(),
            response_time_ms,
            error: Some(e.to_string()),
        },
    }
}

/// Prometheus text exposition
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}
