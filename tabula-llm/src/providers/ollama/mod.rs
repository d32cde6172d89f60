//! Ollama embeddings for locally served models

pub mod embedding;
pub mod types;

pub use embedding::{OllamaEmbeddingProvider, DEFAULT_OLLAMA_URL};
