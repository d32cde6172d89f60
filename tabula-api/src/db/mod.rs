//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! `DbClient` through which the schema manager, CRUD engine and context
//! store reach the database.
//!
//! One pooled connection is acquired per operation and released when the
//! operation returns. There is no cache: every request re-reads the live
//! catalog.

mod context;
mod decode;
mod rows;
mod schema;
pub mod sql;

use std::future::Future;
use std::time::{Duration, Instant};

use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

pub use schema::CreateOutcome;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "tabula".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// Reads `TABULA_DB_HOST`, `TABULA_DB_PORT`, `TABULA_DB_NAME`,
    /// `TABULA_DB_USER`, `TABULA_DB_PASSWORD`, `TABULA_DB_POOL_SIZE` and
    /// `TABULA_DB_TIMEOUT` (seconds). Unparseable numbers fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("TABULA_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("TABULA_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("TABULA_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("TABULA_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("TABULA_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("TABULA_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("TABULA_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first `get` does that.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::storage_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client wrapping a connection pool.
///
/// Cheap to clone; every clone shares the same pool. Operations are split
/// across the `schema`, `rows` and `context` submodules.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    pub(crate) async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    /// Create the engine's bookkeeping tables and trigger function.
    ///
    /// Idempotent; safe to run on every start.
    pub async fn bootstrap(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(&sql::bootstrap()).await?;
        tracing::info!("Engine bookkeeping tables ready");
        Ok(())
    }

    /// Run `fut`, recording its duration and outcome as a DB operation.
    pub(crate) async fn observe<T, F>(&self, operation: &str, table: &str, fut: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        let elapsed = start.elapsed().as_secs_f64();

        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_db_operation(operation, result.is_ok(), elapsed);
        }
        if let Err(err) = &result {
            tracing::debug!(
                operation,
                table,
                code = %err.code,
                "Database operation failed"
            );
        }
        result
    }
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("DbClient")
            .field("size", &status.size)
            .field("max_size", &status.max_size)
            .finish()
    }
}

/// Reject names owned by the engine itself.
pub(crate) fn ensure_not_reserved(table: &str) -> ApiResult<()> {
    if tabula_core::is_reserved_table_name(table) {
        return Err(ApiError::reserved_name(table));
    }
    Ok(())
}
