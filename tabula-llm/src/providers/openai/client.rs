//! OpenAI HTTP client with bounded concurrency

use super::types::ApiErrorBody;
use crate::providers::{invalid_response, rate_limited, request_failed};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tabula_core::TabulaResult;
use tokio::sync::Semaphore;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible API client.
///
/// At most `max_in_flight` requests run at once; further callers wait for a
/// permit instead of hammering the API.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    in_flight: Arc<Semaphore>,
}

impl OpenAIClient {
    /// Create a new client against the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, max_in_flight: usize) -> TabulaResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, max_in_flight, Duration::from_secs(30))
    }

    /// Create a client for any OpenAI-compatible endpoint.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_in_flight: usize,
        timeout: Duration,
    ) -> TabulaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| request_failed("openai", 0, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `endpoint` and decode the JSON response.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> TabulaResult<Res> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| request_failed("openai", 0, format!("Request limiter closed: {}", e)))?;

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, "Sending OpenAI request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| request_failed("openai", 0, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| invalid_response("openai", format!("Failed to parse response: {}", e)));
        }

        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ApiErrorBody>(&error_text)
            .map(|body| body.error.message)
            .unwrap_or(error_text);

        tracing::warn!(status = status.as_u16(), %message, "OpenAI request failed");

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => rate_limited("openai", retry_after_ms),
            _ => request_failed("openai", i32::from(status.as_u16()), message),
        })
    }
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as i64)
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
