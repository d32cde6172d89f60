//! Health Check Endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health/ping - Simple liveness check
//! - /health/ready - Database connectivity check
//! - /health/live - Process alive check

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use serde::{Deserialize, Serialize};
use tabula_llm::ProviderRegistry;

use crate::db::DbClient;
use crate::state::AppState;
use crate::types::Envelope;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthDetails {
    pub database: ComponentHealth,
    /// Configured providers. Missing providers degrade, never fail, readiness.
    pub providers: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: Option<u64>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms,
            error: None,
        }
    }

    fn failing(status: HealthStatus, error: String) -> Self {
        Self {
            status,
            latency_ms: None,
            error: Some(error),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
)]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse),
    ),
)]
pub async fn liveness() -> impl IntoResponse {
    Envelope::ok(HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    })
}

/// GET /health/ready - Readiness check (database connectivity)
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse),
    ),
)]
pub async fn readiness(
    State(db): State<DbClient>,
    State(providers): State<ProviderRegistry>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let database = match check_database(&db).await {
        Ok(latency) => ComponentHealth::healthy(Some(latency)),
        Err(e) => ComponentHealth::failing(HealthStatus::Unhealthy, e),
    };
    let providers = check_providers(&providers);

    let status = overall_status(&database, &providers);
    let response = HealthResponse {
        status,
        message: None,
        details: Some(HealthDetails {
            database,
            providers,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let mut envelope = Envelope::ok(response);
    envelope.success = status_code == StatusCode::OK;
    (status_code, envelope)
}

async fn check_database(db: &DbClient) -> Result<u64, String> {
    let start = Instant::now();

    match db.health_check().await {
        Ok(_) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => Err(format!("Database check failed: {}", e.message)),
    }
}

fn check_providers(providers: &ProviderRegistry) -> ComponentHealth {
    let mut missing = Vec::new();
    if !providers.has_embedding() {
        missing.push("embedding");
    }
    if !providers.has_generation() {
        missing.push("generation");
    }

    if missing.is_empty() {
        ComponentHealth::healthy(None)
    } else {
        ComponentHealth::failing(
            HealthStatus::Degraded,
            format!("No {} provider configured", missing.join(" or ")),
        )
    }
}

fn overall_status(database: &ComponentHealth, providers: &ComponentHealth) -> HealthStatus {
    match (database.status, providers.status) {
        (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
        (_, HealthStatus::Healthy) => HealthStatus::Healthy,
        _ => HealthStatus::Degraded,
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
