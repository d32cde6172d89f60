//! Context store: one semantic descriptor per managed table.

use chrono::{DateTime, Utc};
use tabula_core::{validate_table_name, ContextDescriptor, EmbeddingVector, StorageError};

use super::{sql, DbClient};
use crate::error::{ApiError, ApiResult};

fn decode_context(row: &tokio_postgres::Row) -> ApiResult<ContextDescriptor> {
    let decode_err =
        |e: tokio_postgres::Error| ApiError::storage_error(format!("Failed to decode context: {}", e));

    let table_name: String = row.try_get("table_name").map_err(decode_err)?;
    let description: String = row.try_get("description").map_err(decode_err)?;
    let data: Vec<f32> = row.try_get("embedding").map_err(decode_err)?;
    let model_id: String = row.try_get("model_id").map_err(decode_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode_err)?;

    Ok(ContextDescriptor {
        table_name,
        description,
        embedding: EmbeddingVector::new(data, model_id),
        created_at,
        updated_at,
    })
}

impl DbClient {
    /// Insert or replace the descriptor for `table` in a single statement.
    ///
    /// Callers are expected to have checked that the table is managed and to
    /// pass an embedding freshly derived from `description`.
    pub async fn upsert_context(
        &self,
        table: &str,
        description: &str,
        embedding: &EmbeddingVector,
    ) -> ApiResult<ContextDescriptor> {
        validate_table_name(table)?;

        self.observe("upsert_context", table, async {
            let conn = self.get_conn().await?;
            let row = conn
                .query_one(
                    &sql::upsert_context(),
                    &[&table, &description, &embedding.data, &embedding.model_id],
                )
                .await?;
            decode_context(&row)
        })
        .await
    }

    pub async fn get_context(&self, table: &str) -> ApiResult<ContextDescriptor> {
        validate_table_name(table)?;

        self.observe("get_context", table, async {
            let conn = self.get_conn().await?;
            match conn.query_opt(&sql::get_context(), &[&table]).await? {
                Some(row) => decode_context(&row),
                None => Err(StorageError::ContextNotFound {
                    table: table.to_string(),
                }
                .into()),
            }
        })
        .await
    }

    /// Every stored descriptor, ordered by table name.
    pub async fn list_contexts(&self) -> ApiResult<Vec<ContextDescriptor>> {
        self.observe("list_contexts", "*", async {
            let conn = self.get_conn().await?;
            let rows = conn.query(&sql::list_contexts(), &[]).await?;
            rows.iter().map(decode_context).collect()
        })
        .await
    }

    /// Embedding widths stored for tables other than `table`.
    pub async fn other_context_dimensions(&self, table: &str) -> ApiResult<Vec<i32>> {
        self.observe("other_context_dimensions", table, async {
            let conn = self.get_conn().await?;
            let rows = conn.query(&sql::other_context_dimensions(), &[&table]).await?;
            rows.iter()
                .map(|row| {
                    row.try_get::<_, i32>(0).map_err(|e| {
                        ApiError::storage_error(format!("Failed to decode dimensions: {}", e))
                    })
                })
                .collect()
        })
        .await
    }

    /// Remove the descriptor for `table`, if any. Returns whether one existed.
    pub async fn delete_context(&self, table: &str) -> ApiResult<bool> {
        validate_table_name(table)?;

        self.observe("delete_context", table, async {
            let conn = self.get_conn().await?;
            let affected = conn.execute(&sql::delete_context(), &[&table]).await?;
            Ok(affected > 0)
        })
        .await
    }
}
