//! Embedding Indexer
//!
//! Turns context descriptions into vectors through the configured
//! embedding provider and ranks stored contexts against a query.

use tabula_core::{
    rank_by_distance, ContextDescriptor, EmbeddingVector, Ranked, TabulaResult, VectorError,
};
use tabula_llm::ProviderRegistry;

use crate::db::DbClient;
use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;
use crate::validation::ValidateNonEmpty;

/// Embedding front-end over the provider registry.
#[derive(Clone, Debug)]
pub struct EmbeddingIndexer {
    providers: ProviderRegistry,
}

impl EmbeddingIndexer {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }

    /// Embed `text`, rejecting empty, non-finite or wrongly sized vectors.
    pub async fn embed(&self, text: &str) -> ApiResult<EmbeddingVector> {
        let provider = self.providers.embedding().map_err(ApiError::embedding)?;

        let result: TabulaResult<EmbeddingVector> = match provider.embed(text).await {
            Ok(vector) => match vector.validate(provider.dimensions()) {
                Ok(()) => Ok(vector),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };

        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_embedding_request(provider.model_id(), result.is_ok());
        }

        result.map_err(|e| {
            tracing::warn!(model = provider.model_id(), error = %e, "Embedding request failed");
            ApiError::embedding(e)
        })
    }

    /// Order `candidates` by cosine distance from `query`, closest first.
    pub fn rank(
        &self,
        query: &EmbeddingVector,
        candidates: Vec<ContextDescriptor>,
    ) -> ApiResult<Vec<Ranked<ContextDescriptor>>> {
        rank_by_distance(query, candidates, |c| &c.embedding).map_err(ApiError::embedding)
    }
}

/// Save a table's context: embed the description, then upsert.
///
/// The table must be managed. Nothing is written if embedding fails or the
/// new vector's width differs from the other stored contexts.
pub async fn save_context(
    db: &DbClient,
    indexer: &EmbeddingIndexer,
    table: &str,
    description: &str,
) -> ApiResult<ContextDescriptor> {
    description.validate_non_empty("description")?;
    db.ensure_managed(table).await?;

    let embedding = indexer.embed(description).await?;
    // All stored embeddings share one width.
    if let Some(&stored) = db
        .other_context_dimensions(table)
        .await?
        .iter()
        .find(|&&width| width != embedding.dimensions)
    {
        tracing::warn!(
            table,
            stored,
            got = embedding.dimensions,
            "Embedding width differs from stored contexts"
        );
        return Err(ApiError::embedding(
            VectorError::DimensionMismatch {
                expected: stored,
                got: embedding.dimensions,
            }
            .into(),
        ));
    }
    let context = db.upsert_context(table, description, &embedding).await?;

    tracing::info!(
        table,
        model = %embedding.model_id,
        dimensions = embedding.dimensions,
        "Context saved"
    );
    Ok(context)
}

/// Embed `query` and return the `limit` closest stored contexts.
pub async fn search_contexts(
    db: &DbClient,
    indexer: &EmbeddingIndexer,
    query: &str,
    limit: usize,
) -> ApiResult<Vec<Ranked<ContextDescriptor>>> {
    query.validate_non_empty("query")?;

    let query_vector = indexer.embed(query).await?;
    let contexts = db.list_contexts().await?;

    let mut ranked = indexer.rank(&query_vector, contexts)?;
    ranked.truncate(limit);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use tabula_llm::MockEmbeddingProvider;

    fn indexer(dimensions: i32) -> EmbeddingIndexer {
        let mut providers = ProviderRegistry::new();
        providers.register_embedding(Box::new(MockEmbeddingProvider::new("mock", dimensions)));
        EmbeddingIndexer::new(providers)
    }

    fn context(table: &str, embedding: EmbeddingVector) -> ContextDescriptor {
        ContextDescriptor {
            table_name: table.to_string(),
            description: table.to_string(),
            embedding,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_embed_checks_dimensions() -> ApiResult<()> {
        let vector = indexer(32).embed("people who travel").await?;
        assert_eq!(vector.dimensions, 32);
        assert_eq!(vector.model_id, "mock");
        Ok(())
    }

    #[tokio::test]
    async fn test_embed_without_provider() {
        let indexer = EmbeddingIndexer::new(ProviderRegistry::new());
        let err = indexer.embed("x").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmbeddingError);
    }

    #[tokio::test]
    async fn test_rank_closest_first() -> ApiResult<()> {
        let indexer = indexer(64);
        let query = indexer.embed("flight bookings for travelers").await?;
        let candidates = vec![
            context("invoices", indexer.embed("monthly invoices and payments").await?),
            context("trips", indexer.embed("flight bookings for travelers").await?),
        ];

        let ranked = indexer.rank(&query, candidates)?;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item.table_name, "trips");
        assert!(ranked[0].distance <= ranked[1].distance);
        Ok(())
    }

    #[tokio::test]
    async fn test_rank_rejects_mixed_dimensions() -> ApiResult<()> {
        let indexer = indexer(16);
        let query = indexer.embed("a").await?;
        let candidates = vec![context("t", EmbeddingVector::new(vec![1.0; 8], "other"))];
        let err = indexer.rank(&query, candidates).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmbeddingError);
        Ok(())
    }
}
