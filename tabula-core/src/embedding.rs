//! Embedding vector operations

use crate::{TabulaResult, VectorError};
use serde::{Deserialize, Serialize};

/// Embedding vector with dynamic dimensions.
/// Supports any embedding model dimension (e.g., 384, 768, 1536, 3072).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingVector {
    /// The embedding data as a vector of f32 values.
    pub data: Vec<f32>,
    /// Identifier of the model that produced this embedding.
    pub model_id: String,
    /// Number of dimensions (must match data.len()).
    pub dimensions: i32,
}

impl EmbeddingVector {
    /// Create a new embedding vector.
    pub fn new(data: Vec<f32>, model_id: impl Into<String>) -> Self {
        let dimensions = data.len() as i32;
        Self {
            data,
            model_id: model_id.into(),
            dimensions,
        }
    }

    /// Compute cosine similarity between two embedding vectors.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> TabulaResult<f32> {
        if self.dimensions != other.dimensions || self.data.len() != other.data.len() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: other.dimensions,
            }
            .into());
        }

        let mut dot_product = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.data.iter().zip(other.data.iter()) {
            dot_product += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let norm_a = norm_a.sqrt();
        let norm_b = norm_b.sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }

        Ok(dot_product / (norm_a * norm_b))
    }

    /// Cosine distance, `1 - cosine_similarity`. Lower is closer.
    pub fn cosine_distance(&self, other: &EmbeddingVector) -> TabulaResult<f32> {
        Ok(1.0 - self.cosine_similarity(other)?)
    }

    /// Check if this vector has valid dimensions.
    pub fn is_valid(&self) -> bool {
        self.dimensions > 0 && self.data.len() == self.dimensions as usize
    }

    /// Reject empty vectors, non-finite components, and an unexpected width.
    pub fn validate(&self, expected_dimensions: i32) -> Result<(), VectorError> {
        if !self.is_valid() {
            return Err(VectorError::InvalidVector {
                reason: format!(
                    "declared {} dimensions but holds {} values",
                    self.dimensions,
                    self.data.len()
                ),
            });
        }
        if self.dimensions != expected_dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: expected_dimensions,
                got: self.dimensions,
            });
        }
        if let Some(pos) = self.data.iter().position(|v| !v.is_finite()) {
            return Err(VectorError::InvalidVector {
                reason: format!("component {} is not finite", pos),
            });
        }
        Ok(())
    }
}

/// A candidate paired with its distance from the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranked<T> {
    pub item: T,
    pub distance: f32,
}

/// Order `candidates` by ascending cosine distance from `query`.
///
/// Every candidate comes back exactly once. Ties keep their input order. A
/// candidate with a different dimensionality fails the whole ranking rather
/// than being dropped.
pub fn rank_by_distance<T, F>(
    query: &EmbeddingVector,
    candidates: Vec<T>,
    embedding_of: F,
) -> TabulaResult<Vec<Ranked<T>>>
where
    F: Fn(&T) -> &EmbeddingVector,
{
    let mut ranked = Vec::with_capacity(candidates.len());
    for item in candidates {
        let distance = query.cosine_distance(embedding_of(&item))?;
        ranked.push(Ranked { item, distance });
    }
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(ranked)
}

// =============================================================================
// TESTS
// =============================================================================
