//! NL-to-SQL grounding
//!
//! Retrieves the tables whose contexts are closest to a question, describes
//! their live schemas to the generation provider, and returns the SQL it
//! writes. The SQL is never executed here.

use tabula_core::{ContextDescriptor, TableSchema};
use tabula_llm::{GenerateRequest, ProviderRegistry};

use super::indexer_service::{search_contexts, EmbeddingIndexer};
use crate::db::DbClient;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::types::ChatResponse;
use crate::validation::ValidateNonEmpty;

const SYSTEM_PROMPT: &str = "You translate questions into a single PostgreSQL SELECT statement. \
Use only the tables and columns listed. Quote identifiers with double quotes. \
Every table also has \"id\" (BIGINT), \"created_at\" and \"updated_at\" (TIMESTAMPTZ). \
Reply with the SQL only.";

/// Describe each table (columns with types, then its description) and
/// append the question.
pub fn build_grounding_prompt(question: &str, tables: &[(TableSchema, ContextDescriptor)]) -> String {
    let mut lines = Vec::new();
    if tables.is_empty() {
        lines.push("No tables are known.".to_string());
    }
    for (schema, context) in tables {
        lines.push(format!("Table \"{}\":", schema.table_name));
        lines.extend(schema.columns.iter().map(|column| {
            format!(
                "  - \"{}\" {}{}",
                column.name,
                column.column_type,
                if column.nullable { "" } else { " NOT NULL" }
            )
        }));
        lines.push(format!("  Description: {}", context.description.trim()));
        lines.push(String::new());
    }
    lines.push(format!("Question: {}", question.trim()));
    lines.join("\n")
}

/// Strip Markdown code fences and surrounding whitespace from a completion.
pub fn extract_sql(completion: &str) -> String {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (`sql`, `postgresql`, ...) on the opening fence.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// Answer `question` with generated SQL grounded in the `limit` closest
/// tables.
pub async fn ask(
    db: &DbClient,
    indexer: &EmbeddingIndexer,
    providers: &ProviderRegistry,
    question: &str,
    limit: usize,
) -> ApiResult<ChatResponse> {
    question.validate_non_empty("message")?;
    let generator = providers.generation().map_err(ApiError::generation)?;

    let ranked = search_contexts(db, indexer, question, limit).await?;

    let mut grounding = Vec::with_capacity(ranked.len());
    for entry in ranked {
        let table = entry.item.table_name.clone();
        match db.get_schema(&table).await {
            Ok(schema) => grounding.push((schema, entry.item)),
            Err(err) if err.code == ErrorCode::TableNotFound => {
                tracing::warn!(table = %table, "Context refers to a table that is gone");
            }
            Err(err) => return Err(err),
        }
    }

    let request = GenerateRequest::new(SYSTEM_PROMPT, build_grounding_prompt(question, &grounding));
    let completion = generator
        .generate(&request)
        .await
        .map_err(ApiError::generation)?;

    let sql = extract_sql(&completion);
    if sql.is_empty() {
        return Err(ApiError::new(
            ErrorCode::GenerationError,
            "Generation provider returned no SQL",
        ));
    }

    let tables = grounding
        .into_iter()
        .map(|(schema, _)| schema.table_name)
        .collect();
    tracing::debug!(model = generator.model_id(), "Generated SQL");
    Ok(ChatResponse { sql, tables })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tabula_core::{ColumnDescriptor, ColumnType, EmbeddingVector};

    fn travelers() -> (TableSchema, ContextDescriptor) {
        let schema = TableSchema {
            table_name: "travelers".to_string(),
            columns: vec![
                ColumnDescriptor::new("age", ColumnType::Integer, false),
                ColumnDescriptor::nullable("name", ColumnType::Varchar),
            ],
            update_trigger_installed: true,
        };
        let context = ContextDescriptor {
            table_name: "travelers".to_string(),
            description: " People who booked a trip ".to_string(),
            embedding: EmbeddingVector::new(vec![1.0], "mock"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (schema, context)
    }

    #[test]
    fn test_prompt_lists_columns_and_description() {
        let prompt = build_grounding_prompt("How old is Ada?", &[travelers()]);
        assert!(prompt.contains("Table \"travelers\":"));
        assert!(prompt.contains("\"age\" INTEGER NOT NULL"));
        assert!(prompt.contains("\"name\" VARCHAR\n"));
        assert!(prompt.contains("Description: People who booked a trip\n"));
        assert!(prompt.ends_with("Question: How old is Ada?"));
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_grounding_prompt(" How old is Ada? ", &[travelers()]);
        assert_eq!(
            prompt,
            "Table \"travelers\":\n  - \"age\" INTEGER NOT NULL\n  - \"name\" VARCHAR\n  \
             Description: People who booked a trip\n\nQuestion: How old is Ada?"
        );
        assert_eq!(
            build_grounding_prompt("anything", &[]),
            "No tables are known.\nQuestion: anything"
        );
    }

    #[test]
    fn test_prompt_without_tables() {
        let prompt = build_grounding_prompt("anything", &[]);
        assert!(prompt.starts_with("No tables are known."));
    }

    #[test]
    fn test_extract_sql_strips_fences() {
        assert_eq!(extract_sql("SELECT 1;"), "SELECT 1;");
        assert_eq!(extract_sql("```sql\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(extract_sql("  ```\nSELECT \"age\" FROM \"travelers\"\n```  "), "SELECT \"age\" FROM \"travelers\"");
        assert_eq!(extract_sql("```"), "");
    }
}
