//! OpenAI chat completion provider

use super::client::OpenAIClient;
use super::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::providers::invalid_response;
use crate::{GenerateRequest, GenerationProvider};
use async_trait::async_trait;
use tabula_core::TabulaResult;

/// Text generation through `/chat/completions`.
pub struct OpenAIGenerationProvider {
    client: OpenAIClient,
    model: String,
}

impl OpenAIGenerationProvider {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAIGenerationProvider {
    async fn generate(&self, request: &GenerateRequest) -> TabulaResult<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(request.system.clone()),
                ChatMessage::user(request.prompt.clone()),
            ],
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
        };

        let response: ChatResponse = self.client.request("chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| invalid_response("openai", "No completion in response"))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAIGenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIGenerationProvider")
            .field("model", &self.model)
            .finish()
    }
}
