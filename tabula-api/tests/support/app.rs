use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tabula_api::db::{DbClient, DbConfig};
use tabula_api::{create_api_router, ApiConfig, AppState};
use tabula_llm::ProviderRegistry;
use tower::ServiceExt;

/// Router over a pool that never connects: the configured port has nothing
/// listening and acquisition gives up after one second.
pub fn offline_router(providers: ProviderRegistry) -> Router {
    let config = DbConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        timeout: std::time::Duration::from_secs(1),
        ..DbConfig::default()
    };
    let db = match DbClient::from_config(&config) {
        Ok(db) => db,
        Err(e) => panic!("Failed to create lazy pool: {}", e),
    };
    create_api_router(AppState::new(db, providers), &ApiConfig::default())
}

/// Send one request and decode the JSON body (`Value::Null` when the body is
/// not JSON).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let status = response.status();
    let bytes = match to_bytes(response.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => panic!("Failed to read body: {}", e),
    };
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    raw_request(method, uri, body.to_string())
}

pub fn raw_request(method: &str, uri: &str, body: impl Into<String>) -> Request<Body> {
    match Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
    {
        Ok(request) => request,
        Err(e) => panic!("Invalid request: {}", e),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    match Request::builder().uri(uri).body(Body::empty()) {
        Ok(request) => request,
        Err(e) => panic!("Invalid request: {}", e),
    }
}
