//! OpenAI provider implementation
//!
//! Embeddings via `/embeddings`, SQL generation via `/chat/completions`.

pub mod client;
pub mod embedding;
pub mod generation;
pub mod types;

pub use client::OpenAIClient;
pub use embedding::OpenAIEmbeddingProvider;
pub use generation::OpenAIGenerationProvider;
