//! Context descriptor API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabula_core::{ContextDescriptor, Ranked};

/// Request to save (create or replace) a table's context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveContextRequest {
    pub table_name: Option<String>,
    /// Free-text description; embedded on every save
    pub description: Option<String>,
}

/// A context descriptor as returned to clients. The raw embedding is
/// omitted; its model and width are reported instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextView {
    pub table_name: String,
    pub description: String,
    pub model_id: String,
    pub dimensions: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContextDescriptor> for ContextView {
    fn from(context: ContextDescriptor) -> Self {
        Self {
            dimensions: context.dimensions(),
            model_id: context.embedding.model_id,
            table_name: context.table_name,
            description: context.description,
            created_at: context.created_at,
            updated_at: context.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContextResponse {
    pub context: ContextView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContextListResponse {
    pub contexts: Vec<ContextView>,
}

/// Semantic lookup over stored contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchContextRequest {
    pub query: Option<String>,
    /// Number of results, 1..=100 (default 5)
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchResult {
    pub context: ContextView,
    /// Cosine distance from the query; lower is closer
    pub distance: f32,
}

impl From<Ranked<ContextDescriptor>> for SearchResult {
    fn from(ranked: Ranked<ContextDescriptor>) -> Self {
        Self {
            context: ranked.item.into(),
            distance: ranked.distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tabula_core::EmbeddingVector;

    #[test]
    fn test_context_view_omits_embedding() -> Result<(), serde_json::Error> {
        let at = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
        let context = ContextDescriptor {
            table_name: "travelers".to_string(),
            description: "People who travel".to_string(),
            embedding: EmbeddingVector::new(vec![0.5, 0.5, 0.0], "mock-embedding"),
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(ContextView::from(context))?;
        assert_eq!(json["tableName"], "travelers");
        assert_eq!(json["modelId"], "mock-embedding");
        assert_eq!(json["dimensions"], 3);
        assert!(json.get("embedding").is_none());
        Ok(())
    }
}
