//! REST API Routes Module
//!
//! Route handlers organized by resource:
//! - Table definitions (create, alter, list, introspect, drop)
//! - Generic row CRUD
//! - Context descriptors and similarity search
//! - NL-to-SQL generation
//! - Health check endpoints (Kubernetes-compatible)
//! - CORS support for browser-based clients

pub mod chat;
pub mod context;
pub mod data;
pub mod health;
pub mod tables;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    BoxError, Router,
};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use context::create_router as context_router;
pub use data::create_router as data_router;
pub use health::create_router as health_router;
pub use tables::create_router as tables_router;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint when Swagger UI is not mounted.
#[cfg(all(feature = "openapi", not(feature = "swagger-ui")))]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// ROUTER
// ============================================================================

/// Map errors raised by the middleware stack onto the API error shape.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::timeout("Request")
    } else {
        ApiError::internal_error(format!("Unhandled middleware error: {}", err))
    }
}

/// Create the complete API router.
///
/// - Table definitions at /tables/*
/// - Row CRUD at /data/*
/// - Context descriptors at /context/*
/// - NL-to-SQL at /chat
/// - Health checks at /health/*
/// - Metrics at /metrics
/// - OpenAPI spec at /openapi.json, Swagger UI at /swagger-ui (feature-gated)
///
/// # Middleware Order (outer to inner)
/// 1. CORS - answers preflight requests
/// 2. Observability - tracing and metrics, so timeouts are counted too
/// 3. Timeout - answers 504 when a handler runs past `request_timeout`
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/tables", tables::create_router())
        .nest("/data", data::create_router())
        .nest("/context", context::create_router())
        .route("/chat", post(chat::chat))
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    #[cfg(all(feature = "openapi", not(feature = "swagger-ui")))]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    // Swagger UI serves /openapi.json itself.
    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/openapi.json", crate::openapi::ApiDoc::openapi()),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(config.request_timeout)),
        )
        .layer(from_fn(observability_middleware))
        .layer(build_cors_layer(config))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
