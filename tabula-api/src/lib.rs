//! Tabula API - REST Layer for Dynamic Tables
//!
//! Exposes runtime-defined PostgreSQL tables over HTTP (Axum): table
//! definition, generic row CRUD, per-table context descriptors with
//! embedding search, and SQL generation grounded in those contexts.
//!
//! Every statement is built from validated, quoted identifiers and bound
//! parameters; values are cast to the column's native type by PostgreSQL.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{CreateOutcome, DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode, ErrorEnvelope};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::EmbeddingIndexer;
pub use state::AppState;
pub use types::*;
