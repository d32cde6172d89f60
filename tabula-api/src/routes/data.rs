//! Row REST API Routes
//!
//! Generic CRUD against tables whose shape is resolved per request.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tabula_core::Row;

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult, ErrorEnvelope},
    extractors::{ApiJson, RowPath, TablePath},
    state::AppState,
    types::{
        BulkInsertRequest, DeleteRowResponse, Envelope, InsertRowRequest, PageQuery,
        PageResponse, Pagination, RowResponse, RowsResponse,
    },
    validation::{Page, ValidateNonEmpty},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /data/add - Insert one row
#[utoipa::path(
    post,
    path = "/data/add",
    tag = "Data",
    request_body = InsertRowRequest,
    responses(
        (status = 200, description = "Stored row, including id and timestamps", body = RowResponse),
        (status = 400, description = "Unknown column or invalid value", body = ErrorEnvelope),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
    ),
)]
pub async fn insert_row(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<InsertRowRequest>,
) -> ApiResult<impl IntoResponse> {
    req.table_name.validate_non_empty("tableName")?;
    let table = req.table_name.unwrap_or_default();
    let row = req.data.ok_or_else(|| ApiError::missing_field("data"))?;

    let stored = db.insert_one(&table, &row).await?;
    Ok(Envelope::ok(RowResponse { data: stored }))
}

/// POST /data/bulk-add - Insert many rows in one statement
#[utoipa::path(
    post,
    path = "/data/bulk-add",
    tag = "Data",
    request_body = BulkInsertRequest,
    responses(
        (status = 200, description = "Stored rows in input order", body = RowsResponse),
        (status = 400, description = "Empty or oversized batch, or unknown column", body = ErrorEnvelope),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
    ),
)]
pub async fn bulk_insert(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<BulkInsertRequest>,
) -> ApiResult<impl IntoResponse> {
    req.table_name.validate_non_empty("tableName")?;
    let table = req.table_name.unwrap_or_default();
    let rows = req.data.ok_or_else(|| ApiError::missing_field("data"))?;

    let stored = db.insert_many(&table, &rows).await?;
    Ok(Envelope::ok(RowsResponse { data: stored }))
}

/// GET /data/:name - Page through rows ordered by id
#[utoipa::path(
    get,
    path = "/data/{name}",
    tag = "Data",
    params(("name" = String, Path, description = "Table name"), PageQuery),
    responses(
        (status = 200, description = "One page of rows plus the total count", body = PageResponse),
        (status = 400, description = "Invalid limit or offset", body = ErrorEnvelope),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
    ),
)]
pub async fn list_rows(
    State(db): State<DbClient>,
    TablePath(name): TablePath,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = Page::parse(query.limit.as_deref(), query.offset.as_deref())?;
    let (rows, total) = db.select_page(&name, page).await?;

    Ok(Envelope::ok(PageResponse {
        data: rows,
        pagination: Pagination {
            limit: page.limit,
            offset: page.offset,
            total,
        },
    }))
}

/// PUT /data/:name/:id - Update the supplied columns of one row
#[utoipa::path(
    put,
    path = "/data/{name}/{id}",
    tag = "Data",
    params(
        ("name" = String, Path, description = "Table name"),
        ("id" = i64, Path, description = "Row id"),
    ),
    request_body(content = Object, description = "Columns to change"),
    responses(
        (status = 200, description = "Updated row", body = RowResponse),
        (status = 400, description = "Unknown column or invalid value", body = ErrorEnvelope),
        (status = 404, description = "Table or row not found", body = ErrorEnvelope),
    ),
)]
pub async fn update_row(
    State(db): State<DbClient>,
    RowPath { table, id }: RowPath,
    ApiJson(row): ApiJson<Row>,
) -> ApiResult<impl IntoResponse> {
    let updated = db.update_by_id(&table, id, &row).await?;
    Ok(Envelope::ok(RowResponse { data: updated }))
}

/// DELETE /data/:name/:id - Delete one row
#[utoipa::path(
    delete,
    path = "/data/{name}/{id}",
    tag = "Data",
    params(
        ("name" = String, Path, description = "Table name"),
        ("id" = i64, Path, description = "Row id"),
    ),
    responses(
        (status = 200, description = "Deleted, or no row had the id", body = DeleteRowResponse),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
    ),
)]
pub async fn delete_row(
    State(db): State<DbClient>,
    RowPath { table, id }: RowPath,
) -> ApiResult<impl IntoResponse> {
    let deleted = db.delete_by_id(&table, id).await?;
    Ok(Envelope::ok(DeleteRowResponse { deleted }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/add", axum::routing::post(insert_row))
        .route("/bulk-add", axum::routing::post(bulk_insert))
        .route("/:name", axum::routing::get(list_rows))
        .route("/:name/:id", axum::routing::put(update_row))
        .route("/:name/:id", axum::routing::delete(delete_row))
}
