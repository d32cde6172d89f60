//! Table Definition REST API Routes
//!
//! Create, alter, list, introspect and drop runtime-defined tables.

use axum::{extract::State, response::IntoResponse};
use tabula_core::TableSchema;

use crate::{
    db::DbClient,
    error::{ApiResult, ErrorEnvelope},
    extractors::{ApiJson, TablePath},
    state::AppState,
    types::{
        AlterTableRequest, CreateTableRequest, CreateTableResponse, Empty, Envelope,
        ListTablesResponse,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /tables/create - Create a table
#[utoipa::path(
    post,
    path = "/tables/create",
    tag = "Tables",
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Table created, or an identical table already existed", body = CreateTableResponse),
        (status = 400, description = "Invalid name, type or column set", body = ErrorEnvelope),
        (status = 409, description = "Table exists with a different definition", body = ErrorEnvelope),
    ),
)]
pub async fn create_table(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreateTableRequest>,
) -> ApiResult<impl IntoResponse> {
    let descriptor = req.into_descriptor()?;
    let outcome = db.create_table(&descriptor).await?;

    Ok(Envelope::ok(CreateTableResponse {
        table_name: descriptor.table_name,
        created: outcome.created(),
    }))
}

/// POST /tables/alter - Add a column
#[utoipa::path(
    post,
    path = "/tables/alter",
    tag = "Tables",
    request_body = AlterTableRequest,
    responses(
        (status = 200, description = "Column added", body = Empty),
        (status = 400, description = "Invalid name or type", body = ErrorEnvelope),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
        (status = 409, description = "Column already exists", body = ErrorEnvelope),
    ),
)]
pub async fn alter_table(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<AlterTableRequest>,
) -> ApiResult<impl IntoResponse> {
    let (table, column) = req.into_parts()?;
    db.alter_table(&table, &column).await?;
    Ok(Envelope::ok(Empty {}))
}

/// GET /tables/list - List managed tables
#[utoipa::path(
    get,
    path = "/tables/list",
    tag = "Tables",
    responses(
        (status = 200, description = "Managed table names, sorted", body = ListTablesResponse),
    ),
)]
pub async fn list_tables(State(db): State<DbClient>) -> ApiResult<impl IntoResponse> {
    let tables = db.list_tables().await?;
    Ok(Envelope::ok(ListTablesResponse { tables }))
}

/// GET /tables/:name/schema - Introspect a table
#[utoipa::path(
    get,
    path = "/tables/{name}/schema",
    tag = "Tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Live table schema", body = TableSchema),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
    ),
)]
pub async fn get_schema(
    State(db): State<DbClient>,
    TablePath(name): TablePath,
) -> ApiResult<impl IntoResponse> {
    let schema = db.get_schema(&name).await?;
    Ok(Envelope::ok(schema))
}

/// DELETE /tables/:name - Drop a table and its context
#[utoipa::path(
    delete,
    path = "/tables/{name}",
    tag = "Tables",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Table dropped, or it did not exist", body = Empty),
        (status = 400, description = "Reserved or invalid name", body = ErrorEnvelope),
    ),
)]
pub async fn delete_table(
    State(db): State<DbClient>,
    TablePath(name): TablePath,
) -> ApiResult<impl IntoResponse> {
    db.drop_table(&name).await?;
    Ok(Envelope::ok(Empty {}))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/create", axum::routing::post(create_table))
        .route("/alter", axum::routing::post(alter_table))
        .route("/list", axum::routing::get(list_tables))
        .route("/:name/schema", axum::routing::get(get_schema))
        .route("/:name", axum::routing::delete(delete_table))
}
