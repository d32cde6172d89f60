//! LLM provider implementations
//!
//! Concrete implementations of [`EmbeddingProvider`](crate::EmbeddingProvider)
//! and [`GenerationProvider`](crate::GenerationProvider) backed by HTTP APIs.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaEmbeddingProvider;
pub use openai::{OpenAIClient, OpenAIEmbeddingProvider, OpenAIGenerationProvider};

use tabula_core::{LlmError, TabulaError};

pub(crate) fn request_failed(
    provider: &str,
    status: i32,
    message: impl Into<String>,
) -> TabulaError {
    TabulaError::Llm(LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    })
}

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> TabulaError {
    TabulaError::Llm(LlmError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    })
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> TabulaError {
    TabulaError::Llm(LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    })
}
