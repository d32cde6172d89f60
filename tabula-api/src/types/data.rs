//! Row API types

use serde::{Deserialize, Serialize};
use tabula_core::Row;

/// Request to insert one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertRowRequest {
    pub table_name: Option<String>,
    /// Column name to value
    #[schema(value_type = Option<Object>)]
    pub data: Option<Row>,
}

/// Request to insert many rows in one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertRequest {
    pub table_name: Option<String>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub data: Option<Vec<Row>>,
}

/// Raw `limit`/`offset` query values; parsed strictly by `Page::parse`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size, 0..=1000 (default 100)
    pub limit: Option<String>,
    /// Rows to skip (default 0)
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct RowResponse {
    #[schema(value_type = Object)]
    pub data: Row,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct RowsResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    /// Rows in the table
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PageResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Row>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteRowResponse {
    /// False when no row had the id
    pub deleted: bool,
}
