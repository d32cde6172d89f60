//! Path extractors for table names and row ids.
//!
//! Only the raw segments are extracted here; table names are checked by
//! the identifier validator in the database layer, and row ids are parsed
//! strictly so `1.0` or `abc` become a 400 in the standard envelope.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::ApiError;
use crate::validation::parse_row_id;

/// `/:name` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePath(pub String);

/// `/:name/:id` segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPath {
    pub table: String,
    pub id: i64,
}

fn path_error(parts: &Parts, err: impl std::fmt::Display) -> ApiError {
    ApiError::invalid_input(format!("Invalid path '{}': {}", parts.uri.path(), err))
}

#[async_trait]
impl<S> FromRequestParts<S> for TablePath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(name): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| path_error(parts, e))?;
        Ok(TablePath(name))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RowPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((table, raw_id)): Path<(String, String)> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| path_error(parts, e))?;
        Ok(RowPath {
            table,
            id: parse_row_id(&raw_id)?,
        })
    }
}
