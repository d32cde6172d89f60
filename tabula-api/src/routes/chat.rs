//! NL-to-SQL Route
//!
//! Answers a natural-language question with SQL grounded in the closest
//! table contexts. The SQL is returned as text and never executed.

use axum::{extract::State, response::IntoResponse};
use tabula_llm::ProviderRegistry;

use crate::{
    constants::{DEFAULT_ASK_LIMIT, MAX_SEARCH_LIMIT},
    db::DbClient,
    error::{ApiResult, ErrorEnvelope},
    extractors::ApiJson,
    services::{ask, EmbeddingIndexer},
    types::{ChatRequest, ChatResponse, Envelope},
    validation::{ValidateNonEmpty, ValidateRange},
};

/// POST /chat - Generate SQL for a question
#[utoipa::path(
    post,
    path = "/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Generated SQL and the tables that grounded it", body = ChatResponse),
        (status = 400, description = "Missing message or limit out of range", body = ErrorEnvelope),
        (status = 500, description = "Embedding or generation failed", body = ErrorEnvelope),
    ),
)]
pub async fn chat(
    State(db): State<DbClient>,
    State(indexer): State<EmbeddingIndexer>,
    State(providers): State<ProviderRegistry>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    req.message.validate_non_empty("message")?;
    let limit = req.limit.unwrap_or(DEFAULT_ASK_LIMIT);
    limit.validate_range("limit", 1, MAX_SEARCH_LIMIT)?;
    let message = req.message.unwrap_or_default();

    let answer = ask(&db, &indexer, &providers, &message, limit).await?;
    Ok(Envelope::ok(answer))
}
