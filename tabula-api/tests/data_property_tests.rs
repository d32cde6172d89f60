#![cfg(feature = "db-tests")]
//! Property-Based Tests for Generic Row CRUD
//!
//! Rows written through the engine read back with the same values, gain an
//! id and timestamps, come back in input order from bulk inserts, and are
//! addressed only through bound parameters.
//!
//! Requires a live PostgreSQL 14+ reachable through `TABULA_DB_*`.

use std::time::Duration;

use proptest::prelude::*;
use tabula_api::validation::Page;
use tabula_api::{ApiResult, DbClient, ErrorCode};
use tabula_core::{CellValue, ColumnDescriptor, ColumnType, Row, TableDescriptor};
use tabula_test_utils::assertions::assert_row_contains;
use tabula_test_utils::fixtures::{every_type_table, traveler, travelers_table, unique_table_name};
use tabula_test_utils::generators::{arb_full_row, arb_partial_row, arb_table_descriptor};
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

async fn with_travelers(db: &DbClient) -> ApiResult<String> {
    let name = unique_table_name("travelers");
    db.create_table(&travelers_table(&name)).await?;
    Ok(name)
}

fn timestamp(row: &Row, column: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    match row.get(column) {
        Some(CellValue::Timestamp(ts)) => Some(*ts),
        _ => None,
    }
}

// ============================================================================
// EXAMPLES
// ============================================================================

#[tokio::test]
async fn test_insert_then_select() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let stored = db.insert_one(&table, &Row::new().with("age", 30i64)).await?;
    assert!(stored.id().is_some());
    assert!(timestamp(&stored, "created_at").is_some());
    assert!(timestamp(&stored, "updated_at").is_some());
    assert_eq!(stored.get("name"), Some(&CellValue::Null));

    let (rows, total) = db.select_page(&table, Page { limit: 10, offset: 0 }).await?;
    assert_eq!(total, 1);
    assert_eq!(rows, vec![stored]);
    assert_eq!(rows[0].get("age"), Some(&CellValue::Integer(30)));

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_row_succeeds() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    assert!(!db.delete_by_id(&table, 999_999).await?);

    let stored = db.insert_one(&table, &traveler("Ada", 36)).await?;
    let id = stored.id().unwrap_or_default();
    assert!(db.delete_by_id(&table, id).await?);
    assert!(!db.delete_by_id(&table, id).await?);

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_bulk_insert_fills_missing_columns_with_null() -> ApiResult<()> {
    let db = test_db_client().await?;
    let name = unique_table_name("t");
    db.create_table(&TableDescriptor::new(
        name.as_str(),
        vec![
            ColumnDescriptor::nullable("a", ColumnType::Integer),
            ColumnDescriptor::nullable("b", ColumnType::Integer),
        ],
    ))
    .await?;

    let stored = db
        .insert_many(
            &name,
            &[Row::new().with("a", 1i64), Row::new().with("b", 2i64)],
        )
        .await?;

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].get("a"), Some(&CellValue::Integer(1)));
    assert_eq!(stored[0].get("b"), Some(&CellValue::Null));
    assert_eq!(stored[1].get("a"), Some(&CellValue::Null));
    assert_eq!(stored[1].get("b"), Some(&CellValue::Integer(2)));
    assert!(stored[0].id() < stored[1].id());

    db.drop_table(&name).await?;
    Ok(())
}

#[tokio::test]
async fn test_update_refreshes_updated_at() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let stored = db.insert_one(&table, &traveler("Ada", 36)).await?;
    let id = stored.id().unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let updated = db.update_by_id(&table, id, &Row::new().with("age", 37i64)).await?;
    assert_eq!(updated.get("age"), Some(&CellValue::Integer(37)));
    assert_eq!(updated.get("name"), Some(&CellValue::Text("Ada".to_string())));
    assert_eq!(timestamp(&updated, "created_at"), timestamp(&stored, "created_at"));
    assert!(timestamp(&updated, "updated_at") > timestamp(&stored, "updated_at"));

    let err = db
        .update_by_id(&table, id + 1000, &Row::new().with("age", 1i64))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RowNotFound);

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_writes_reject_unknown_and_engine_columns() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let err = db
        .insert_one(&table, &Row::new().with("nickname", "Ada"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownColumn);

    let err = db
        .insert_one(&table, &Row::new().with("id", 5i64).with("age", 3i64))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidIdentifier);

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_database_rejects_uncastable_value() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let err = db
        .insert_one(&table, &Row::new().with("age", "thirty"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageError);

    let err = db
        .insert_one(&table, &Row::new().with("name", "Ada"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageError, "NOT NULL violation");

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_injection_attempt_is_stored_as_data() -> ApiResult<()> {
    let db = test_db_client().await?;
    let table = with_travelers(&db).await?;

    let payload = "x'); DROP TABLE _tabula_tables; --";
    let stored = db.insert_one(&table, &traveler(payload, 1)).await?;
    assert_eq!(stored.get("name"), Some(&CellValue::Text(payload.to_string())));
    assert!(db.list_tables().await?.contains(&table));

    db.drop_table(&table).await?;
    Ok(())
}

#[tokio::test]
async fn test_rows_on_unknown_table() -> ApiResult<()> {
    let db = test_db_client().await?;
    let missing = unique_table_name("missing");

    let err = db
        .insert_one(&missing, &Row::new().with("age", 1i64))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);

    let err = db.select_page(&missing, Page::default()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);
    Ok(())
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every registered type stores and reads back unchanged.
    #[test]
    fn prop_every_type_round_trip(
        rows in arb_full_row(&every_type_table("every_type")).prop_flat_map(|first| {
            prop::collection::vec(arb_full_row(&every_type_table("every_type")), 0..4)
                .prop_map(move |mut rest| {
                    rest.insert(0, first.clone());
                    rest
                })
        })
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let db = test_db_client().await.map_err(fail)?;
            let name = unique_table_name("every_type");
            db.create_table(&every_type_table(&name)).await.map_err(fail)?;

            let stored = db.insert_many(&name, &rows).await.map_err(fail)?;
            let (page, total) = db.select_page(&name, Page::default()).await.map_err(fail)?;
            db.drop_table(&name).await.map_err(fail)?;

            prop_assert_eq!(stored.len(), rows.len());
            prop_assert_eq!(total, rows.len() as i64);
            prop_assert_eq!(&page, &stored);
            for (input, output) in rows.iter().zip(stored.iter()) {
                assert_row_contains(output, input);
            }
            Ok(())
        })?;
    }

    /// Partial rows leave the omitted columns NULL.
    #[test]
    fn prop_partial_rows_null_elsewhere(
        (table, row) in arb_table_descriptor().prop_flat_map(|table| {
            let row = arb_partial_row(&table);
            (Just(table), row)
        })
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let db = test_db_client().await.map_err(fail)?;
            let name = unique_table_name("partial");
            let table = TableDescriptor::new(name.as_str(), table.columns.clone());
            db.create_table(&table).await.map_err(fail)?;

            let stored = db.insert_one(&name, &row).await.map_err(fail)?;
            db.drop_table(&name).await.map_err(fail)?;

            assert_row_contains(&stored, &row);
            for column in &table.columns {
                if row.get(&column.name).is_none() {
                    prop_assert_eq!(stored.get(&column.name), Some(&CellValue::Null));
                }
            }
            Ok(())
        })?;
    }

    /// Pages never overlap and together cover the table in id order.
    #[test]
    fn prop_pages_partition_rows(count in 1usize..30, limit in 1i64..10) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let db = test_db_client().await.map_err(fail)?;
            let table = with_travelers(&db).await.map_err(fail)?;
            let rows: Vec<Row> = (0..count).map(|i| traveler("t", i as i64)).collect();
            let stored = db.insert_many(&table, &rows).await.map_err(fail)?;

            let mut seen = Vec::new();
            let mut offset = 0;
            loop {
                let (page, total) = db
                    .select_page(&table, Page { limit, offset })
                    .await
                    .map_err(fail)?;
                prop_assert_eq!(total, count as i64);
                if page.is_empty() {
                    break;
                }
                prop_assert!(page.len() as i64 <= limit);
                seen.extend(page);
                offset += limit;
            }
            db.drop_table(&table).await.map_err(fail)?;

            prop_assert_eq!(seen, stored);
            Ok(())
        })?;
    }
}
