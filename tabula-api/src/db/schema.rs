//! Schema manager: create, introspect, alter and drop dynamic tables.

use tabula_core::{
    is_engine_column, validate_table_name, ColumnDescriptor, ColumnType, StorageError,
    TableDescriptor, TableSchema, TOUCH_TRIGGER,
};
use tokio_postgres::GenericClient;

use super::{ensure_not_reserved, sql, DbClient};
use crate::error::{ApiError, ApiResult};

/// Result of a create-table request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The table was materialized by this request.
    Created,
    /// A managed table with the same columns already existed.
    AlreadyExists,
}

impl CreateOutcome {
    pub fn created(&self) -> bool {
        matches!(self, CreateOutcome::Created)
    }
}

fn text(row: &tokio_postgres::Row, idx: usize) -> ApiResult<String> {
    row.try_get::<_, String>(idx)
        .map_err(|e| ApiError::storage_error(format!("Failed to read catalog row: {}", e)))
}

fn flag(row: &tokio_postgres::Row) -> ApiResult<bool> {
    row.try_get::<_, bool>(0)
        .map_err(|e| ApiError::storage_error(format!("Failed to read catalog row: {}", e)))
}

pub(super) async fn exists<C: GenericClient>(conn: &C, query: &str, table: &str) -> ApiResult<bool> {
    let row = conn.query_one(query, &[&table]).await?;
    flag(&row)
}

/// Fail with `TableNotFound` unless `table` is registered and materialized.
pub(super) async fn require_managed<C: GenericClient>(conn: &C, table: &str) -> ApiResult<()> {
    if exists(conn, &sql::is_managed(), table).await? {
        Ok(())
    } else {
        Err(ApiError::table_not_found(table))
    }
}

/// Read the live shape of `table` from the catalog.
///
/// Engine-owned columns are left out. A native type the registry cannot map
/// back is reported, never relabelled.
pub(super) async fn load_schema<C: GenericClient>(conn: &C, table: &str) -> ApiResult<TableSchema> {
    let rows = conn.query(sql::describe_columns(), &[&table]).await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name = text(row, 0)?;
        if is_engine_column(&name) {
            continue;
        }
        let data_type = text(row, 1)?;
        let nullable = text(row, 2)? == "YES";
        let column_type =
            ColumnType::from_native(&data_type).ok_or_else(|| StorageError::UnmappedNativeType {
                table: table.to_string(),
                column: name.clone(),
                native: data_type.clone(),
            })?;
        columns.push(ColumnDescriptor::new(name, column_type, nullable));
    }

    let trigger = conn
        .query_one(sql::trigger_installed(), &[&table, &TOUCH_TRIGGER])
        .await?;

    Ok(TableSchema {
        table_name: table.to_string(),
        columns,
        update_trigger_installed: flag(&trigger)?,
    })
}

impl DbClient {
    /// Materialize a table, or confirm an identical one already exists.
    ///
    /// A managed table with the same name and different columns is a
    /// `SchemaConflict`. A same-named table the engine did not create, or a
    /// reserved name, is a `DuplicateTable`. Re-creating an identical table
    /// re-installs a missing `updated_at` trigger.
    ///
    /// A new table is registered, materialized and given its trigger in one
    /// transaction.
    pub async fn create_table(&self, table: &TableDescriptor) -> ApiResult<CreateOutcome> {
        table.validate()?;
        let name = table.table_name.as_str();
        if tabula_core::is_reserved_table_name(name) {
            return Err(StorageError::DuplicateTable {
                table: name.to_string(),
            }
            .into());
        }

        self.observe("create_table", name, async {
            let mut conn = self.get_conn().await?;

            let materialized = exists(&**conn, sql::table_exists(), name).await?;
            let registered = exists(&**conn, &sql::is_registered(), name).await?;

            if materialized && !registered {
                return Err(StorageError::DuplicateTable {
                    table: name.to_string(),
                }
                .into());
            }

            if materialized {
                let live = load_schema(&**conn, name).await?;
                if let Some(reason) = live.descriptor().shape_difference(table) {
                    return Err(StorageError::SchemaConflict {
                        table: name.to_string(),
                        reason,
                    }
                    .into());
                }
                if !live.update_trigger_installed {
                    conn.batch_execute(&sql::install_touch_trigger(name)).await?;
                    tracing::warn!(table = name, "Re-installed missing updated_at trigger");
                }
                return Ok(CreateOutcome::AlreadyExists);
            }

            // Registry row, table and trigger commit together.
            let tx = conn.transaction().await?;
            tx.execute(&sql::register_table(), &[&name]).await?;
            tx.batch_execute(&sql::create_table(table)).await?;
            tx.batch_execute(&sql::install_touch_trigger(name)).await?;
            tx.commit().await?;

            tracing::info!(
                table = name,
                operation = "create_table",
                columns = table.columns.len(),
                "Table created"
            );
            Ok(CreateOutcome::Created)
        })
        .await
    }

    /// Append one column to a managed table.
    pub async fn alter_table(&self, table: &str, column: &ColumnDescriptor) -> ApiResult<()> {
        validate_table_name(table)?;
        column.validate()?;

        self.observe("alter_table", table, async {
            let conn = self.get_conn().await?;
            require_managed(&**conn, table).await?;

            let live = load_schema(&**conn, table).await?;
            if live.column(&column.name).is_some() {
                return Err(StorageError::DuplicateColumn {
                    table: table.to_string(),
                    column: column.name.clone(),
                }
                .into());
            }

            conn.batch_execute(&sql::add_column(table, column)).await?;
            tracing::info!(
                table,
                operation = "alter_table",
                column = %column.name,
                column_type = %column.column_type,
                "Column added"
            );
            Ok(())
        })
        .await
    }

    /// Managed tables that are currently materialized, sorted by name.
    pub async fn list_tables(&self) -> ApiResult<Vec<String>> {
        self.observe("list_tables", "*", async {
            let conn = self.get_conn().await?;
            let rows = conn.query(&sql::list_managed_tables(), &[]).await?;
            rows.iter().map(|row| text(row, 0)).collect()
        })
        .await
    }

    /// Live introspection of a managed table.
    pub async fn get_schema(&self, table: &str) -> ApiResult<TableSchema> {
        validate_table_name(table)?;

        self.observe("get_schema", table, async {
            let conn = self.get_conn().await?;
            require_managed(&**conn, table).await?;
            load_schema(&**conn, table).await
        })
        .await
    }

    /// Fail with `TableNotFound` unless `table` is a managed table.
    pub async fn ensure_managed(&self, table: &str) -> ApiResult<()> {
        validate_table_name(table)?;
        let conn = self.get_conn().await?;
        require_managed(&**conn, table).await
    }

    /// Drop a managed table together with its context and registry entry.
    ///
    /// Returns whether anything was dropped. Unknown and unmanaged tables
    /// are left alone; reserved names are rejected.
    pub async fn drop_table(&self, table: &str) -> ApiResult<bool> {
        validate_table_name(table)?;
        ensure_not_reserved(table)?;

        self.observe("drop_table", table, async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await?;

            if !exists(&*tx, &sql::is_registered(), table).await? {
                tx.commit().await?;
                return Ok(false);
            }

            tx.batch_execute(&sql::drop_table(table)).await?;
            tx.execute(&sql::delete_context(), &[&table]).await?;
            tx.execute(&sql::unregister_table(), &[&table]).await?;
            tx.commit().await?;

            tracing::info!(table, operation = "drop_table", "Table dropped");
            Ok(true)
        })
        .await
    }
}
