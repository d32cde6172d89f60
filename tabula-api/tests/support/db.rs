#![allow(dead_code)]

use tabula_api::db::{DbClient, DbConfig};
use tabula_api::{ApiError, ApiResult};

/// Client for the database named by the `TABULA_DB_*` variables, with the
/// engine's bookkeeping tables in place.
pub async fn test_db_client() -> ApiResult<DbClient> {
    let db = DbClient::from_config(&DbConfig::from_env())?;
    db.bootstrap().await?;
    Ok(db)
}

/// Run statements outside the engine, e.g. to leave a table in the state a
/// crash or a manual change would.
pub async fn raw_execute(statements: &str) -> ApiResult<()> {
    let pool = DbConfig::from_env().create_pool()?;
    let conn = pool.get().await.map_err(ApiError::from)?;
    conn.batch_execute(statements).await?;
    Ok(())
}

/// Evaluate a single-boolean query with `name` bound as `$1`.
pub async fn raw_flag(query: &str, name: &str) -> ApiResult<bool> {
    let pool = DbConfig::from_env().create_pool()?;
    let conn = pool.get().await.map_err(ApiError::from)?;
    let row = conn.query_one(query, &[&name]).await?;
    row.try_get(0)
        .map_err(|e| ApiError::storage_error(format!("Failed to read flag: {}", e)))
}
