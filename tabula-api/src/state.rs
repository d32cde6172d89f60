//! Shared application state for Axum routers.

use std::time::Instant;

use tabula_llm::ProviderRegistry;

use crate::db::DbClient;
use crate::services::EmbeddingIndexer;

/// Application-wide state shared across all routes.
///
/// Every field is cheap to clone; handlers extract only what they need via
/// `State<T>`.
#[derive(Clone)]
pub struct AppState {
    /// Pooled database client. Each operation checks out one connection.
    pub db: DbClient,
    /// Embedding front-end used by context save and search.
    pub indexer: EmbeddingIndexer,
    /// Configured providers, for capabilities beyond embedding.
    pub providers: ProviderRegistry,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(db: DbClient, providers: ProviderRegistry) -> Self {
        Self {
            db,
            indexer: EmbeddingIndexer::new(providers.clone()),
            providers,
            start_time: Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(DbClient, db);
crate::impl_from_ref!(EmbeddingIndexer, indexer);
crate::impl_from_ref!(ProviderRegistry, providers);
crate::impl_from_ref!(Instant, start_time);
