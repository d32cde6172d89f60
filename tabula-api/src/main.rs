//! Tabula API Server Entry Point
//!
//! Bootstraps logging and configuration, prepares the engine's bookkeeping
//! tables, and starts the Axum HTTP server.

use axum::Router;
use tabula_api::telemetry::{init_logging, LoggingConfig};
use tabula_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbClient, DbConfig};
use tabula_llm::{build_registry, ProviderConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let logging_config = LoggingConfig::from_env();
    init_logging(&logging_config)?;

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;
    db.bootstrap().await?;

    let provider_config = ProviderConfig::from_env()
        .map_err(|e| ApiError::internal_error(format!("Invalid provider configuration: {}", e)))?;
    let providers = build_registry(&provider_config)
        .map_err(|e| ApiError::internal_error(format!("Failed to build providers: {}", e)))?;
    if !providers.has_embedding() {
        tracing::warn!("No embedding provider configured; context endpoints will fail");
    }

    let api_config = ApiConfig::from_env()?;
    let app: Router = create_api_router(AppState::new(db, providers), &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, version = %logging_config.service_version, "Starting Tabula API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
