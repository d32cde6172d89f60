//! Context REST API Routes
//!
//! One semantic descriptor per managed table, plus similarity search over
//! the stored descriptors.

use axum::{extract::State, response::IntoResponse};

use crate::{
    constants::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT},
    db::DbClient,
    error::{ApiResult, ErrorEnvelope},
    extractors::{ApiJson, TablePath},
    services::{save_context as index_context, search_contexts, EmbeddingIndexer},
    state::AppState,
    types::{
        ContextListResponse, ContextResponse, Empty, Envelope, SaveContextRequest,
        SearchContextRequest, SearchResponse,
    },
    validation::{ValidateNonEmpty, ValidateRange},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /context - Save (create or replace) a table's context
#[utoipa::path(
    post,
    path = "/context",
    tag = "Context",
    request_body = SaveContextRequest,
    responses(
        (status = 200, description = "Context saved", body = ContextResponse),
        (status = 400, description = "Missing table name or description", body = ErrorEnvelope),
        (status = 404, description = "Table not found", body = ErrorEnvelope),
        (status = 500, description = "Embedding failed; nothing was written", body = ErrorEnvelope),
    ),
)]
pub async fn save_context(
    State(db): State<DbClient>,
    State(indexer): State<EmbeddingIndexer>,
    ApiJson(req): ApiJson<SaveContextRequest>,
) -> ApiResult<impl IntoResponse> {
    req.table_name.validate_non_empty("tableName")?;
    req.description.validate_non_empty("description")?;
    let table = req.table_name.unwrap_or_default();
    let description = req.description.unwrap_or_default();

    let context = index_context(&db, &indexer, &table, &description).await?;
    Ok(Envelope::ok(ContextResponse {
        context: context.into(),
    }))
}

/// GET /context - List every stored context
#[utoipa::path(
    get,
    path = "/context",
    tag = "Context",
    responses(
        (status = 200, description = "Contexts ordered by table name", body = ContextListResponse),
    ),
)]
pub async fn list_contexts(State(db): State<DbClient>) -> ApiResult<impl IntoResponse> {
    let contexts = db.list_contexts().await?;
    Ok(Envelope::ok(ContextListResponse {
        contexts: contexts.into_iter().map(Into::into).collect(),
    }))
}

/// GET /context/:name - Get one table's context
#[utoipa::path(
    get,
    path = "/context/{name}",
    tag = "Context",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Context found", body = ContextResponse),
        (status = 404, description = "No context for this table", body = ErrorEnvelope),
    ),
)]
pub async fn get_context(
    State(db): State<DbClient>,
    TablePath(name): TablePath,
) -> ApiResult<impl IntoResponse> {
    let context = db.get_context(&name).await?;
    Ok(Envelope::ok(ContextResponse {
        context: context.into(),
    }))
}

/// DELETE /context/:name - Remove a table's context
#[utoipa::path(
    delete,
    path = "/context/{name}",
    tag = "Context",
    params(("name" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Context removed, or there was none", body = Empty),
        (status = 400, description = "Invalid table name", body = ErrorEnvelope),
    ),
)]
pub async fn delete_context(
    State(db): State<DbClient>,
    TablePath(name): TablePath,
) -> ApiResult<impl IntoResponse> {
    db.delete_context(&name).await?;
    Ok(Envelope::ok(Empty {}))
}

/// POST /context/search - Rank stored contexts against a query
#[utoipa::path(
    post,
    path = "/context/search",
    tag = "Context",
    request_body = SearchContextRequest,
    responses(
        (status = 200, description = "Closest contexts first", body = SearchResponse),
        (status = 400, description = "Missing query or limit out of range", body = ErrorEnvelope),
        (status = 500, description = "Embedding failed", body = ErrorEnvelope),
    ),
)]
pub async fn search(
    State(db): State<DbClient>,
    State(indexer): State<EmbeddingIndexer>,
    ApiJson(req): ApiJson<SearchContextRequest>,
) -> ApiResult<impl IntoResponse> {
    req.query.validate_non_empty("query")?;
    let limit = req.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    limit.validate_range("limit", 1, MAX_SEARCH_LIMIT)?;
    let query = req.query.unwrap_or_default();

    let ranked = search_contexts(&db, &indexer, &query, limit).await?;
    Ok(Envelope::ok(SearchResponse {
        results: ranked.into_iter().map(Into::into).collect(),
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/",
            axum::routing::post(save_context).get(list_contexts),
        )
        .route("/search", axum::routing::post(search))
        .route(
            "/:name",
            axum::routing::get(get_context).delete(delete_context),
        )
}
