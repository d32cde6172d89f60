//! OpenAI embedding provider implementation

use super::client::OpenAIClient;
use super::types::{EmbeddingRequest, EmbeddingResponse};
use crate::providers::invalid_response;
use crate::EmbeddingProvider;
use async_trait::async_trait;
use tabula_core::{EmbeddingVector, TabulaResult};

/// OpenAI embedding provider using text-embedding-3-small or a custom model.
pub struct OpenAIEmbeddingProvider {
    client: OpenAIClient,
    model: String,
    dimensions: i32,
}

impl OpenAIEmbeddingProvider {
    /// Create a new OpenAI embedding provider.
    ///
    /// # Arguments
    /// * `client` - Configured API client
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `dimensions` - Requested embedding width (sent to the API)
    pub fn new(client: OpenAIClient, model: impl Into<String>, dimensions: i32) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> TabulaResult<EmbeddingVector> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: vec![text.to_string()],
            dimensions: Some(self.dimensions),
        };

        let response: EmbeddingResponse = self.client.request("embeddings", &request).await?;
        let mut data = response.data.into_iter();
        match (data.next(), data.next()) {
            (Some(item), None) => Ok(EmbeddingVector::new(item.embedding, self.model.clone())),
            (None, _) => Err(invalid_response("openai", "No embedding data in response")),
            (Some(_), Some(_)) => Err(invalid_response(
                "openai",
                "Expected one embedding for one input",
            )),
        }
    }

    fn dimensions(&self) -> i32 {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAIEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIEmbeddingProvider")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}
