//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Every request runs inside an `http_request` span, is logged on
//! completion, and is counted in the Prometheus HTTP metrics.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::METRICS;

static NUMERIC_SEGMENT: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)"));

/// Path segments under the resource prefixes that are route words, not
/// table names.
const FIXED_SEGMENTS: &[&str] = &["create", "alter", "list", "add", "bulk-add", "search", "schema"];

/// Normalize a raw path for metric labels.
///
/// Only used when the router has not resolved a route template, e.g. for
/// unmatched paths or rejected methods. Under `/tables`, `/data` and
/// `/context` every segment that is not a route word is replaced by
/// `:name` (first) or `:id` (second); elsewhere numeric segments become
/// `{id}`.
fn normalize_path(path: &str) -> String {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match segments.next() {
        Some(root @ ("tables" | "data" | "context")) => {
            let mut label = format!("/{}", root);
            for (position, segment) in segments.enumerate() {
                label.push('/');
                if FIXED_SEGMENTS.contains(&segment) {
                    label.push_str(segment);
                } else if position == 0 {
                    label.push_str(":name");
                } else {
                    label.push_str(":id");
                }
            }
            label
        }
        _ => match NUMERIC_SEGMENT.as_ref() {
            Ok(pattern) => pattern.replace_all(path, "/{id}$1").into_owned(),
            Err(_) => path.to_string(),
        },
    }
}

/// Route label for a request: the matched template (`/data/:name/:id`)
/// when available, so user-defined table names never become label values.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| normalize_path(request.uri().path()))
}

/// Observability middleware for Axum.
///
/// This middleware wraps every request with:
/// 1. A tracing span carrying method, target and route
/// 2. Prometheus metrics recording
/// 3. Request/response logging
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(method.as_str(), &route, status.as_u16(), duration.as_secs_f64());
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
