//! Tabula LLM - Provider Abstraction Layer
//!
//! Provider-agnostic traits for the two external capabilities the engine
//! depends on: turning text into an embedding vector, and turning a prompt
//! into generated text. Concrete HTTP providers live in [`providers`];
//! deterministic mocks are provided for tests and offline development.

pub mod config;
pub mod providers;

pub use config::{build_registry, EmbeddingBackend, GenerationBackend, ProviderConfig};

use async_trait::async_trait;
use std::sync::Arc;
use tabula_core::{EmbeddingVector, LlmError, TabulaError, TabulaResult};

// ============================================================================
// EMBEDDING PROVIDER TRAIT
// ============================================================================

/// Trait for embedding providers.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> TabulaResult<EmbeddingVector>;

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> i32;

    /// Model identifier (e.g., "text-embedding-3-small").
    fn model_id(&self) -> &str;
}

// ============================================================================
// GENERATION PROVIDER TRAIT
// ============================================================================

/// A single text generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Instructions that frame the task.
    pub system: String,
    /// The user-facing prompt.
    pub prompt: String,
    pub max_tokens: i32,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// Trait for text generation providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produce a completion for `request`.
    async fn generate(&self, request: &GenerateRequest) -> TabulaResult<String>;

    /// Model identifier (e.g., "gpt-4o-mini").
    fn model_id(&self) -> &str;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Registry for LLM providers.
/// Providers must be explicitly registered - no auto-discovery.
///
/// # Example
/// ```ignore
/// let mut registry = ProviderRegistry::new();
/// registry.register_embedding(Box::new(MockEmbeddingProvider::new("mock", 64)));
/// let vector = registry.embedding()?.embed("hello").await?;
/// ```
#[derive(Clone)]
pub struct ProviderRegistry {
    embedding: Option<Arc<dyn EmbeddingProvider>>,
    generation: Option<Arc<dyn GenerationProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    pub fn new() -> Self {
        Self {
            embedding: None,
            generation: None,
        }
    }

    /// Register an embedding provider, replacing any previous one.
    pub fn register_embedding(&mut self, provider: Box<dyn EmbeddingProvider>) {
        self.embedding = Some(Arc::from(provider));
    }

    /// Register a generation provider, replacing any previous one.
    pub fn register_generation(&mut self, provider: Box<dyn GenerationProvider>) {
        self.generation = Some(Arc::from(provider));
    }

    /// Get the registered embedding provider.
    pub fn embedding(&self) -> TabulaResult<Arc<dyn EmbeddingProvider>> {
        self.embedding.clone().ok_or_else(|| {
            TabulaError::Llm(LlmError::ProviderNotConfigured {
                capability: "embedding".to_string(),
            })
        })
    }

    /// Get the registered generation provider.
    pub fn generation(&self) -> TabulaResult<Arc<dyn GenerationProvider>> {
        self.generation.clone().ok_or_else(|| {
            TabulaError::Llm(LlmError::ProviderNotConfigured {
                capability: "generation".to_string(),
            })
        })
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn has_generation(&self) -> bool {
        self.generation.is_some()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("embedding", &self.embedding.as_ref().map(|p| p.model_id().to_string()))
            .field("generation", &self.generation.as_ref().map(|p| p.model_id().to_string()))
            .finish()
    }
}

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// Mock embedding provider for testing and offline use.
///
/// Builds a deterministic bag-of-words vector: every lowercase word is hashed
/// into a bucket, and the result is normalized to unit length. Texts sharing
/// words land closer together, which keeps retrieval tests meaningful.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    model_id: String,
    dimensions: i32,
}

impl MockEmbeddingProvider {
    pub fn new(model_id: impl Into<String>, dimensions: i32) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions: dimensions.max(1),
        }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let dims = self.dimensions as usize;
        let mut data = vec![0.0f32; dims];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = fnv1a(word.to_lowercase().as_bytes());
            data[(hash % dims as u64) as usize] += 1.0;
        }

        // Non-empty input without words still needs a direction.
        if data.iter().all(|x| *x == 0.0) && !text.is_empty() {
            data[(fnv1a(text.as_bytes()) % dims as u64) as usize] = 1.0;
        }

        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }

        data
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> TabulaResult<EmbeddingVector> {
        Ok(EmbeddingVector::new(
            self.generate_embedding(text),
            self.model_id.clone(),
        ))
    }

    fn dimensions(&self) -> i32 {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock generation provider that answers every prompt with a fixed response.
#[derive(Debug, Clone)]
pub struct MockGenerationProvider {
    model_id: String,
    response: String,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::with_response("SELECT 1;")
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            model_id: "mock-generation".to_string(),
            response: response.into(),
        }
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(&self, _request: &GenerateRequest) -> TabulaResult<String> {
        Ok(self.response.clone())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_registry_new_is_empty() {
        let registry = ProviderRegistry::new();
        assert!(!registry.has_embedding());
        assert!(!registry.has_generation());
        assert!(matches!(
            registry.embedding(),
            Err(TabulaError::Llm(LlmError::ProviderNotConfigured { .. }))
        ));
    }

    #[test]
    fn test_provider_registry_register() {
        let mut registry = ProviderRegistry::new();
        registry.register_embedding(Box::new(MockEmbeddingProvider::new("test-model", 64)));
        registry.register_generation(Box::new(MockGenerationProvider::new()));
        assert!(registry.has_embedding());
        assert!(registry.has_generation());
        assert_eq!(
            registry.embedding().map(|p| p.dimensions()).ok(),
            Some(64)
        );
    }

    #[tokio::test]
    async fn test_mock_embedding_dimensions_and_norm() -> TabulaResult<()> {
        let provider = MockEmbeddingProvider::new("test-model", 128);
        let embedding = provider.embed("Travelers and their ages").await?;
        assert_eq!(embedding.dimensions, 128);
        assert_eq!(embedding.data.len(), 128);
        assert_eq!(embedding.model_id, "test-model");

        let norm: f32 = embedding.data.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_embedding_deterministic() -> TabulaResult<()> {
        let provider = MockEmbeddingProvider::new("test-model", 64);
        let e1 = provider.embed("hello world").await?;
        let e2 = provider.embed("hello world").await?;
        assert_eq!(e1.data, e2.data);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_embedding_differs_for_different_text() -> TabulaResult<()> {
        let provider = MockEmbeddingProvider::new("test-model", 256);
        let e1 = provider.embed("Travelers and their ages").await?;
        let e2 = provider.embed("Flights booked per airline").await?;
        assert_ne!(e1.data, e2.data);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_embedding_shared_words_are_closer() -> TabulaResult<()> {
        let provider = MockEmbeddingProvider::new("test-model", 256);
        let query = provider.embed("traveler ages").await?;
        let related = provider.embed("each traveler and their ages").await?;
        let unrelated = provider.embed("invoice totals by quarter").await?;

        let near = query.cosine_distance(&related)?;
        let far = query.cosine_distance(&unrelated)?;
        assert!(near < far);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_generation_returns_response() -> TabulaResult<()> {
        let provider = MockGenerationProvider::with_response("SELECT * FROM \"travelers\";");
        let out = provider
            .generate(&GenerateRequest::new("system", "list travelers"))
            .await?;
        assert_eq!(out, "SELECT * FROM \"travelers\";");
        Ok(())
    }
}
