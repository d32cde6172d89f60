//! Semantic descriptors attached to managed tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingVector;

/// Free-text description of a table plus the embedding derived from it.
///
/// The embedding is regenerated from `description` on every save, so the
/// two always correspond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDescriptor {
    pub table_name: String,
    pub description: String,
    pub embedding: EmbeddingVector,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContextDescriptor {
    pub fn model_id(&self) -> &str {
        &self.embedding.model_id
    }

    pub fn dimensions(&self) -> i32 {
        self.embedding.dimensions
    }
}
