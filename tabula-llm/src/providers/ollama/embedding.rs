//! Ollama embedding provider implementation (local models)

use super::types::{EmbeddingRequest, EmbeddingResponse};
use crate::providers::{invalid_response, request_failed};
use crate::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tabula_core::{EmbeddingVector, TabulaResult};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama embedding provider for locally served models.
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: i32,
}

impl OllamaEmbeddingProvider {
    /// Create a new Ollama embedding provider.
    ///
    /// # Arguments
    /// * `base_url` - Ollama server URL (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "nomic-embed-text")
    /// * `dimensions` - Embedding width the model produces
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: i32,
    ) -> TabulaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| request_failed("ollama", 0, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> TabulaResult<EmbeddingVector> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_failed("ollama", 0, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), "Ollama embedding request failed");
            return Err(request_failed(
                "ollama",
                i32::from(status.as_u16()),
                error_text,
            ));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            invalid_response("ollama", format!("Failed to parse response: {}", e))
        })?;

        Ok(EmbeddingVector::new(body.embedding, self.model.clone()))
    }

    fn dimensions(&self) -> i32 {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OllamaEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEmbeddingProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}
