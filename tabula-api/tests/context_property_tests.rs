#![cfg(feature = "db-tests")]
//! Property-Based Tests for the Context Store and Embedding Index
//!
//! Saving a context replaces the previous descriptor and re-embeds the new
//! description; search ranks stored descriptors by cosine distance; dropping
//! a table takes its descriptor with it. Embeddings come from the
//! deterministic mock provider.
//!
//! Requires a live PostgreSQL 14+ reachable through `TABULA_DB_*`.

use proptest::prelude::*;
use tabula_api::services::{ask, save_context, search_contexts, EmbeddingIndexer};
use tabula_api::{ApiResult, DbClient, ErrorCode};
use tabula_llm::{MockEmbeddingProvider, MockGenerationProvider, ProviderRegistry};
use tabula_test_utils::assertions::assert_valid_embedding;
use tabula_test_utils::fixtures::{mock_providers, travelers_table, unique_table_name, MOCK_DIMENSIONS};
use tabula_test_utils::generators::arb_description;
use tokio::runtime::Runtime;

#[path = "support/db.rs"]
mod test_db_support;
use test_db_support::test_db_client;

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn fail(e: tabula_api::ApiError) -> TestCaseError {
    TestCaseError::fail(format!("{}: {}", e.code, e.message))
}

fn indexer() -> EmbeddingIndexer {
    EmbeddingIndexer::new(mock_providers())
}

async fn with_travelers(db: &DbClient) -> ApiResult<String> {
    let name = unique_table_name("travelers");
    db.create_table(&travelers_table(&name)).await?;
    Ok(name)
}

// ============================================================================
// EXAMPLES
// ============================================================================

#[tokio::test]
async fn test_second_save_replaces_first() -> ApiResult<()> {
    let db = test_db_client().await?;
    let indexer = indexer();
    let table = with_travelers(&db).await?;

    let first = save_context(&db, &indexer, &table, "People who travel for work").await?;
    let second = save_context(&db, &indexer, &table, "Frequent flyer loyalty members").await?;

    let stored = db.get_context(&table).await?;
    assert_eq!(stored.description, "Frequent flyer loyalty members");
    assert_eq!(stored.embedding, second.embedding);
    assert_ne!(stored.embedding.data, first.embedding.data);
    assert_eq!(stored.created_at, first.created_at);
    assert!(stored.updated_at >= first.updated_at);
    assert_valid_embedding(&stored.embedding);
    assert_eq!(stored.dimensions(), MOCK_DIMENSIONS);

    let matching: Vec<_> = db
        .list_contexts()
        .await?
        .into_iter()
        .filter(|c| c.table_name == table)
        .collect();
    assert_eq!(matching.len(), 1);

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_save_requires_managed_table() -> ApiResult<()> {
    let db = test_db_client().await?;
    let err = save_context(&db, &indexer(), &unique_table_name("missing"), "Anything")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);
    Ok(())
}

#[tokio::test]
async fn test_save_without_embedding_provider_writes_nothing() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let indexer = EmbeddingIndexer::new(ProviderRegistry::new());
    let err = save_context(&db, &indexer, &table, "People who travel")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmbeddingError);

    let err = db.get_context(&table).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ContextNotFound);

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_save_rejects_width_different_from_stored_contexts() -> ApiResult<()> {
    let db = test_db_client().await?;
    let travelers = with_travelers(&db).await?;
    let invoices = with_travelers(&db).await?;
    save_context(&db, &indexer(), &travelers, "People who travel").await?;

    let mut narrow = ProviderRegistry::new();
    narrow.register_embedding(Box::new(MockEmbeddingProvider::new("mock-narrow", 8)));
    let err = save_context(&db, &EmbeddingIndexer::new(narrow), &invoices, "Invoices")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmbeddingError);
    assert_eq!(
        db.get_context(&invoices).await.unwrap_err().code,
        ErrorCode::ContextNotFound
    );
    assert_eq!(db.get_context(&travelers).await?.dimensions(), MOCK_DIMENSIONS);

    db.drop_table(&travelers).await?;
    db.drop_table(&invoices).await?;
    Ok(())
}

#[tokio::test]
async fn test_drop_table_removes_context() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;
    save_context(&db, &indexer(), &table, "People who travel").await?;

    db.drop_table(&table).await?;

    assert!(!db.list_tables().await?.contains(&table));
    assert!(db
        .list_contexts()
        .await?
        .iter()
        .all(|c| c.table_name != table));
    Ok(())
}

#[tokio::test]
async fn test_delete_context_is_idempotent() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;
    save_context(&db, &indexer(), &table, "People who travel").await?;

    assert!(db.delete_context(&table).await?);
    assert!(!db.delete_context(&table).await?);
    let err = db.get_context(&table).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ContextNotFound);

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_search_finds_exact_description_first() -> ApiResult<()> {
    let db = test_db_client().await?;
    let indexer = indexer();
    let travelers = with_travelers(&db).await?;
    let invoices = with_travelers(&db).await?;

    let travel_text = format!("{} passengers itineraries boarding gates", travelers);
    let invoice_text = format!("{} invoices payments ledger balances", invoices);
    save_context(&db, &indexer, &travelers, &travel_text).await?;
    save_context(&db, &indexer, &invoices, &invoice_text).await?;

    let results = search_contexts(&db, &indexer, &travel_text, 5).await?;
    assert!(!results.is_empty());
    assert!(results.len() <= 5);
    assert_eq!(results[0].item.table_name, travelers);
    assert!(results[0].distance.abs() < 1e-5);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));

    db.drop_table(&travelers).await?;
    db.drop_table(&invoices).await?;
    Ok(())
}

#[tokio::test]
async fn test_ask_grounds_prompt_in_closest_table() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let mut providers = mock_providers();
    providers.register_generation(Box::new(MockGenerationProvider::with_response(format!(
        "```sql\nSELECT COUNT(*) FROM \"{}\";\n```",
        table
    ))));
    let indexer = EmbeddingIndexer::new(providers.clone());

    let description = format!("{} travelers with name and age", table);
    save_context(&db, &indexer, &table, &description).await?;

    let answer = ask(&db, &indexer, &providers, &description, 3).await?;
    assert_eq!(answer.sql, format!("SELECT COUNT(*) FROM \"{}\";", table));
    assert_eq!(answer.tables.first(), Some(&table));

    db.drop_table(&table).await?;
    Ok(())
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// The stored embedding is always the embedding of the latest description.
    #[test]
    fn prop_saved_embedding_tracks_description(
        descriptions in prop::collection::vec(arb_description(), 1..4)
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let db = test_db_client().await.map_err(fail)?;
            let indexer = indexer();
            let table = with_travelers(&db).await.map_err(fail)?;

            for description in &descriptions {
                save_context(&db, &indexer, &table, description).await.map_err(fail)?;
            }
            let stored = db.get_context(&table).await.map_err(fail)?;
            let latest = descriptions.last().cloned().unwrap_or_default();
            let expected = indexer.embed(&latest).await.map_err(fail)?;
            db.drop_table(&table).await.map_err(fail)?;

            prop_assert_eq!(stored.description, latest);
            prop_assert_eq!(stored.embedding, expected);
            Ok(())
        })?;
    }
}
