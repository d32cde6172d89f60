//! Generic CRUD over tables whose shape is resolved per request.

use tabula_core::{
    validate_column_name, validate_table_name, Row, StorageError, TableSchema, ValidationError,
};
use tokio_postgres::types::ToSql;

use super::decode::{decode_row, decode_rows};
use super::schema::{load_schema, require_managed};
use super::sql::{self, WriteColumn};
use super::DbClient;
use crate::constants::{MAX_BATCH_ROWS, MAX_BIND_PARAMETERS};
use crate::error::{ApiError, ApiResult};
use crate::validation::Page;

/// Map each supplied column name onto the live schema.
///
/// Engine-owned columns fail the identifier check; names the table does not
/// have are `UnknownColumn`.
fn write_columns<'a, I>(schema: &'a TableSchema, names: I) -> ApiResult<Vec<WriteColumn<'a>>>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| {
            validate_column_name(name)?;
            let column = schema
                .column(name)
                .ok_or_else(|| ValidationError::UnknownColumn {
                    table: schema.table_name.clone(),
                    column: name.to_string(),
                })?;
            Ok(WriteColumn {
                name: column.name.as_str(),
                column_type: column.column_type,
            })
        })
        .collect()
}

/// Union of column names across `rows`, in first-seen order.
pub(crate) fn column_union(rows: &[Row]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        for name in row.columns() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Row-major bind values. A column absent from a row binds NULL.
fn bind_values(rows: &[Row], columns: &[WriteColumn<'_>]) -> Vec<Option<String>> {
    let mut values = Vec::with_capacity(rows.len() * columns.len());
    for row in rows {
        for column in columns {
            values.push(
                row.get(column.name)
                    .and_then(|cell| cell.to_bind_text(column.column_type)),
            );
        }
    }
    values
}

fn as_params(values: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn check_batch(rows: &[Row], column_count: usize) -> ApiResult<()> {
    if rows.len() > MAX_BATCH_ROWS {
        return Err(ApiError::invalid_input(format!(
            "Batch of {} rows exceeds the limit of {}",
            rows.len(),
            MAX_BATCH_ROWS
        ))
        .with_details(serde_json::json!({ "field": "data", "max": MAX_BATCH_ROWS })));
    }
    if rows.len() * column_count > MAX_BIND_PARAMETERS {
        return Err(ApiError::invalid_input(format!(
            "Batch needs {} parameters; at most {} are allowed per statement",
            rows.len() * column_count,
            MAX_BIND_PARAMETERS
        )));
    }
    Ok(())
}

impl DbClient {
    /// Insert one row and return it as stored, engine-owned columns included.
    pub async fn insert_one(&self, table: &str, row: &Row) -> ApiResult<Row> {
        if row.is_empty() {
            return Err(ValidationError::NoColumnsProvided.into());
        }
        let mut stored = self.insert_rows("insert_one", table, std::slice::from_ref(row)).await?;
        stored
            .pop()
            .ok_or_else(|| ApiError::storage_error("Insert returned no row"))
    }

    /// Insert a batch in one statement; stored rows come back in input order.
    pub async fn insert_many(&self, table: &str, rows: &[Row]) -> ApiResult<Vec<Row>> {
        if rows.is_empty() {
            return Err(ValidationError::NoRowsProvided.into());
        }
        self.insert_rows("insert_many", table, rows).await
    }

    async fn insert_rows(&self, operation: &str, table: &str, rows: &[Row]) -> ApiResult<Vec<Row>> {
        validate_table_name(table)?;
        let names = column_union(rows);
        if names.is_empty() {
            return Err(ValidationError::NoColumnsProvided.into());
        }
        check_batch(rows, names.len())?;

        self.observe(operation, table, async {
            let conn = self.get_conn().await?;
            require_managed(&**conn, table).await?;
            let schema = load_schema(&**conn, table).await?;

            let columns = write_columns(&schema, names.iter().copied())?;
            let statement = sql::insert_rows(table, &columns, rows.len());
            let values = bind_values(rows, &columns);

            let stored = conn.query(&statement, &as_params(&values)).await?;
            decode_rows(table, &stored)
        })
        .await
    }

    /// One page of rows ordered by id, plus the table's total row count.
    pub async fn select_page(&self, table: &str, page: Page) -> ApiResult<(Vec<Row>, i64)> {
        validate_table_name(table)?;

        self.observe("select_page", table, async {
            let conn = self.get_conn().await?;
            require_managed(&**conn, table).await?;

            let rows = conn
                .query(&sql::select_page(table, page.limit, page.offset), &[])
                .await?;
            let total: i64 = conn
                .query_one(&sql::count_rows(table), &[])
                .await?
                .try_get(0)
                .map_err(|e| ApiError::storage_error(format!("Failed to read row count: {}", e)))?;

            Ok((decode_rows(table, &rows)?, total))
        })
        .await
    }

    /// Update the supplied columns of row `id`; `updated_at` is refreshed by
    /// the table's trigger.
    pub async fn update_by_id(&self, table: &str, id: i64, row: &Row) -> ApiResult<Row> {
        validate_table_name(table)?;
        if row.is_empty() {
            return Err(ValidationError::NoColumnsProvided.into());
        }

        self.observe("update_by_id", table, async {
            let conn = self.get_conn().await?;
            require_managed(&**conn, table).await?;
            let schema = load_schema(&**conn, table).await?;

            let columns = write_columns(&schema, row.columns())?;
            let statement = sql::update_by_id(table, &columns);
            let values = bind_values(std::slice::from_ref(row), &columns);

            let mut params = as_params(&values);
            params.push(&id);

            match conn.query_opt(&statement, &params).await? {
                Some(updated) => decode_row(table, &updated),
                None => Err(StorageError::RowNotFound {
                    table: table.to_string(),
                    id,
                }
                .into()),
            }
        })
        .await
    }

    /// Delete row `id`. Deleting a row that does not exist succeeds.
    pub async fn delete_by_id(&self, table: &str, id: i64) -> ApiResult<bool> {
        validate_table_name(table)?;

        self.observe("delete_by_id", table, async {
            let conn = self.get_conn().await?;
            require_managed(&**conn, table).await?;
            let affected = conn.execute(&sql::delete_by_id(table), &[&id]).await?;
            Ok(affected > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tabula_core::{CellValue, ColumnDescriptor, ColumnType};

    fn schema() -> TableSchema {
        TableSchema {
            table_name: "t".to_string(),
            columns: vec![
                ColumnDescriptor::nullable("a", ColumnType::Integer),
                ColumnDescriptor::nullable("b", ColumnType::Integer),
            ],
            update_trigger_installed: true,
        }
    }

    #[test]
    fn test_column_union_first_seen_order() {
        let rows = vec![
            Row::new().with("b", 1i64),
            Row::new().with("a", 2i64).with("b", 3i64),
            Row::new().with("c", 4i64),
        ];
        assert_eq!(column_union(&rows), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_absent_columns_bind_null() -> ApiResult<()> {
        let schema = schema();
        let rows = vec![Row::new().with("a", 1i64), Row::new().with("b", 2i64)];
        let columns = write_columns(&schema, column_union(&rows))?;
        assert_eq!(
            bind_values(&rows, &columns),
            vec![Some("1".to_string()), None, None, Some("2".to_string())]
        );
        Ok(())
    }

    #[test]
    fn test_explicit_null_binds_null() -> ApiResult<()> {
        let schema = schema();
        let rows = vec![Row::new().with("a", CellValue::Null)];
        let columns = write_columns(&schema, column_union(&rows))?;
        assert_eq!(bind_values(&rows, &columns), vec![None]);
        Ok(())
    }

    #[test]
    fn test_unknown_column_rejected() {
        let err = write_columns(&schema(), ["nickname"]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownColumn);
    }

    #[test]
    fn test_engine_columns_not_writable() {
        for name in ["id", "created_at", "UPDATED_AT"] {
            let err = write_columns(&schema(), [name]).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidIdentifier, "{}", name);
        }
    }

    #[test]
    fn test_batch_limits() {
        let rows = vec![Row::new().with("a", 1i64); MAX_BATCH_ROWS + 1];
        assert_eq!(check_batch(&rows, 1).unwrap_err().code, ErrorCode::InvalidInput);

        let rows = vec![Row::new().with("a", 1i64); MAX_BATCH_ROWS];
        assert!(check_batch(&rows, 1).is_ok());
        assert!(check_batch(&rows, 66).is_err());
    }
}
