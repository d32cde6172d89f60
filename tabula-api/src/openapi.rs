//! OpenAPI Specification for the Tabula API
//!
//! This module defines the OpenAPI document for the Tabula REST API.
//! It uses utoipa to generate the OpenAPI specification from Rust types
//! and route annotations.

use utoipa::OpenApi;

use crate::error::{ErrorCode, ErrorEnvelope};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{chat, context, data, health, tables};
use crate::telemetry::metrics;
use crate::types::*;

use tabula_core::{ColumnDescriptor, ColumnType, TableSchema};

/// OpenAPI document for the Tabula API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tabula API",
        version = "0.1.0",
        description = "Runtime-defined PostgreSQL tables with generic CRUD and a semantic context index",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Tables", description = "Create, alter, introspect and drop dynamic tables"),
        (name = "Data", description = "Generic row CRUD against dynamic tables"),
        (name = "Context", description = "Table descriptions, their embeddings and similarity search"),
        (name = "Chat", description = "SQL generation grounded in table contexts"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Table Routes ===
        tables::create_table,
        tables::alter_table,
        tables::list_tables,
        tables::get_schema,
        tables::delete_table,

        // === Data Routes ===
        data::insert_row,
        data::bulk_insert,
        data::list_rows,
        data::update_row,
        data::delete_row,

        // === Context Routes ===
        context::save_context,
        context::list_contexts,
        context::get_context,
        context::delete_context,
        context::search,

        // === Chat Routes ===
        chat::chat,

        // === Health & Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            // === Error Types ===
            ErrorEnvelope, ErrorCode,

            // === Table Types ===
            ColumnDefinition, CreateTableRequest, CreateTableResponse, AlterTableRequest,
            ListTablesResponse, Empty,

            // === Data Types ===
            InsertRowRequest, BulkInsertRequest, RowResponse, RowsResponse,
            Pagination, PageResponse, DeleteRowResponse,

            // === Context Types ===
            SaveContextRequest, ContextView, ContextResponse, ContextListResponse,
            SearchContextRequest, SearchResult, SearchResponse,

            // === Chat Types ===
            ChatRequest, ChatResponse,

            // === Health Types ===
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,

            // === Core Schema Types (from tabula-core) ===
            ColumnType, ColumnDescriptor, TableSchema
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
