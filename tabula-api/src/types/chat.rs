//! NL-to-SQL API types

use serde::{Deserialize, Serialize};

/// A natural-language question about the stored tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    pub message: Option<String>,
    /// Number of tables used for grounding, 1..=100 (default 3)
    pub limit: Option<usize>,
}

/// Generated SQL. It is returned as text and never executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatResponse {
    pub sql: String,
    /// Tables whose schemas grounded the prompt, closest first
    pub tables: Vec<String>,
}
