//! Provider selection from environment variables.

use std::str::FromStr;
use std::time::Duration;

use tabula_core::{ConfigError, TabulaError, TabulaResult};

use crate::providers::ollama::embedding::DEFAULT_OLLAMA_URL;
use crate::providers::openai::client::DEFAULT_BASE_URL;
use crate::providers::{
    OllamaEmbeddingProvider, OpenAIClient, OpenAIEmbeddingProvider, OpenAIGenerationProvider,
};
use crate::{MockEmbeddingProvider, MockGenerationProvider, ProviderRegistry};

/// Which service produces embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    OpenAi,
    Ollama,
    Mock,
}

impl FromStr for EmbeddingBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(EmbeddingBackend::OpenAi),
            "ollama" => Ok(EmbeddingBackend::Ollama),
            "mock" => Ok(EmbeddingBackend::Mock),
            other => Err(ConfigError::ProviderNotSupported {
                provider: other.to_string(),
            }),
        }
    }
}

/// Which service produces generated SQL. `None` disables the ask endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBackend {
    OpenAi,
    Mock,
    None,
}

impl FromStr for GenerationBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(GenerationBackend::OpenAi),
            "mock" => Ok(GenerationBackend::Mock),
            "none" | "" => Ok(GenerationBackend::None),
            other => Err(ConfigError::ProviderNotSupported {
                provider: other.to_string(),
            }),
        }
    }
}

/// Provider configuration.
#[derive(Clone)]
pub struct ProviderConfig {
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
    pub embedding_dimensions: i32,
    pub generation_backend: GenerationBackend,
    pub generation_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub ollama_url: String,
    pub max_in_flight: usize,
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            embedding_backend: EmbeddingBackend::Mock,
            embedding_model: "mock-embedding".to_string(),
            embedding_dimensions: 256,
            generation_backend: GenerationBackend::None,
            generation_model: "gpt-4o-mini".to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            max_in_flight: 8,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABULA_EMBEDDING_PROVIDER`: openai | ollama | mock (default: mock)
    /// - `TABULA_EMBEDDING_MODEL`: model name (default depends on provider)
    /// - `TABULA_EMBEDDING_DIMENSIONS`: embedding width (default depends on provider)
    /// - `TABULA_GENERATION_PROVIDER`: openai | mock | none (default: none)
    /// - `TABULA_GENERATION_MODEL`: chat model (default: gpt-4o-mini)
    /// - `OPENAI_API_KEY`, `TABULA_OPENAI_BASE_URL`
    /// - `TABULA_OLLAMA_URL` (default: http://localhost:11434)
    /// - `TABULA_LLM_MAX_IN_FLIGHT`, `TABULA_LLM_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let embedding_backend = match std::env::var("TABULA_EMBEDDING_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.embedding_backend,
        };
        let (default_model, default_dims) = match embedding_backend {
            EmbeddingBackend::OpenAi => ("text-embedding-3-small", 1536),
            EmbeddingBackend::Ollama => ("nomic-embed-text", 768),
            EmbeddingBackend::Mock => ("mock-embedding", defaults.embedding_dimensions),
        };

        let embedding_dimensions = match std::env::var("TABULA_EMBEDDING_DIMENSIONS") {
            Ok(value) => value
                .parse::<i32>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "TABULA_EMBEDDING_DIMENSIONS".to_string(),
                    value: value.clone(),
                    reason: "must be a positive integer".to_string(),
                })?,
            Err(_) => default_dims,
        };

        let generation_backend = match std::env::var("TABULA_GENERATION_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.generation_backend,
        };

        Ok(Self {
            embedding_backend,
            embedding_model: std::env::var("TABULA_EMBEDDING_MODEL")
                .unwrap_or_else(|_| default_model.to_string()),
            embedding_dimensions,
            generation_backend,
            generation_model: std::env::var("TABULA_GENERATION_MODEL")
                .unwrap_or(defaults.generation_model),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_base_url: std::env::var("TABULA_OPENAI_BASE_URL")
                .unwrap_or(defaults.openai_base_url),
            ollama_url: std::env::var("TABULA_OLLAMA_URL").unwrap_or(defaults.ollama_url),
            max_in_flight: std::env::var("TABULA_LLM_MAX_IN_FLIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_in_flight),
            request_timeout: std::env::var("TABULA_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        })
    }

    fn openai_client(&self) -> TabulaResult<OpenAIClient> {
        let api_key = self.openai_api_key.clone().ok_or_else(|| {
            TabulaError::Config(ConfigError::MissingRequired {
                field: "OPENAI_API_KEY".to_string(),
            })
        })?;
        OpenAIClient::with_base_url(
            api_key,
            self.openai_base_url.clone(),
            self.max_in_flight,
            self.request_timeout,
        )
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("embedding_backend", &self.embedding_backend)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("generation_backend", &self.generation_backend)
            .field("generation_model", &self.generation_model)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Build a registry holding the providers `config` selects.
pub fn build_registry(config: &ProviderConfig) -> TabulaResult<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();

    match config.embedding_backend {
        EmbeddingBackend::OpenAi => registry.register_embedding(Box::new(
            OpenAIEmbeddingProvider::new(
                config.openai_client()?,
                config.embedding_model.clone(),
                config.embedding_dimensions,
            ),
        )),
        EmbeddingBackend::Ollama => registry.register_embedding(Box::new(
            OllamaEmbeddingProvider::new(
                config.ollama_url.clone(),
                config.embedding_model.clone(),
                config.embedding_dimensions,
            )?,
        )),
        EmbeddingBackend::Mock => registry.register_embedding(Box::new(
            MockEmbeddingProvider::new(
                config.embedding_model.clone(),
                config.embedding_dimensions,
            ),
        )),
    }

    match config.generation_backend {
        GenerationBackend::OpenAi => registry.register_generation(Box::new(
            OpenAIGenerationProvider::new(config.openai_client()?, config.generation_model.clone()),
        )),
        GenerationBackend::Mock => {
            registry.register_generation(Box::new(MockGenerationProvider::new()))
        }
        GenerationBackend::None => {}
    }

    tracing::info!(
        embedding = ?config.embedding_backend,
        embedding_model = %config.embedding_model,
        dimensions = config.embedding_dimensions,
        generation = ?config.generation_backend,
        "LLM providers configured"
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("OpenAI".parse::<EmbeddingBackend>(), Ok(EmbeddingBackend::OpenAi));
        assert_eq!("ollama".parse::<EmbeddingBackend>(), Ok(EmbeddingBackend::Ollama));
        assert_eq!("mock".parse::<EmbeddingBackend>(), Ok(EmbeddingBackend::Mock));
        assert!("cohere".parse::<EmbeddingBackend>().is_err());

        assert_eq!("none".parse::<GenerationBackend>(), Ok(GenerationBackend::None));
        assert_eq!("Mock".parse::<GenerationBackend>(), Ok(GenerationBackend::Mock));
        assert!("anthropic".parse::<GenerationBackend>().is_err());
    }

    #[test]
    fn test_default_registry_uses_mock_embedding() -> TabulaResult<()> {
        let registry = build_registry(&ProviderConfig::default())?;
        assert!(registry.has_embedding());
        assert!(!registry.has_generation());
        assert_eq!(registry.embedding()?.dimensions(), 256);
        Ok(())
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = ProviderConfig {
            embedding_backend: EmbeddingBackend::OpenAi,
            openai_api_key: None,
            ..ProviderConfig::default()
        };
        assert!(matches!(
            build_registry(&config),
            Err(TabulaError::Config(ConfigError::MissingRequired { .. }))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig {
            openai_api_key: Some("sk-secret".to_string()),
            ..ProviderConfig::default()
        };
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
