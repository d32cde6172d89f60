//! Error types for Tabula operations

use thiserror::Error;

/// Which kind of identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Table,
    Column,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Table => f.write_str("table"),
            IdentifierKind::Column => f.write_str("column"),
        }
    }
}

/// Input validation errors. These never reach the database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        name: String,
        reason: String,
    },

    #[error("Unknown column type '{token}'")]
    UnknownType { token: String },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("No columns provided")]
    NoColumnsProvided,

    #[error("No rows provided")]
    NoRowsProvided,

    #[error("Column '{column}' does not exist on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column '{column}' is listed more than once")]
    DuplicateColumnName { column: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    #[error("No context stored for table '{table}'")]
    ContextNotFound { table: String },

    #[error("Row {id} not found in table '{table}'")]
    RowNotFound { table: String, id: i64 },

    #[error("Table '{table}' already exists")]
    DuplicateTable { table: String },

    #[error("Table '{table}' already exists with a different definition: {reason}")]
    SchemaConflict { table: String, reason: String },

    #[error("Column '{column}' already exists on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column '{column}' on table '{table}' has unsupported storage type '{native}'")]
    UnmappedNativeType {
        table: String,
        column: String,
        native: String,
    },

    #[error("Query failed: {message}")]
    QueryFailed {
        sqlstate: Option<String>,
        message: String,
    },
}

/// LLM provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No {capability} provider configured")]
    ProviderNotConfigured { capability: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Provider not supported: {provider}")]
    ProviderNotSupported { provider: String },
}

/// Vector operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: i32, got: i32 },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },
}

/// Master error type for all Tabula errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TabulaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}

/// Result type alias for Tabula operations.
pub type TabulaResult<T> = Result<T, TabulaError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identifier_display() {
        let err = ValidationError::InvalidIdentifier {
            kind: IdentifierKind::Column,
            name: "a-b".to_string(),
            reason: "contains '-'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("column"));
        assert!(msg.contains("a-b"));
    }

    #[test]
    fn test_unknown_column_display() {
        let err = ValidationError::UnknownColumn {
            table: "travelers".to_string(),
            column: "nickname".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("travelers"));
        assert!(msg.contains("nickname"));
    }

    #[test]
    fn test_row_not_found_display() {
        let err = StorageError::RowNotFound {
            table: "travelers".to_string(),
            id: 42,
        };
        assert_eq!(err.to_string(), "Row 42 not found in table 'travelers'");
    }

    #[test]
    fn test_llm_error_display_rate_limited() {
        let err = LlmError::RateLimited {
            provider: "openai".to_string(),
            retry_after_ms: 1500,
        };
        let msg = err.to_string();
        assert!(msg.contains("openai"));
        assert!(msg.contains("1500"));
    }

    #[test]
    fn test_vector_error_display_dimension_mismatch() {
        let err = VectorError::DimensionMismatch {
            expected: 1536,
            got: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("1536"));
        assert!(msg.contains("768"));
    }

    #[test]
    fn test_tabula_error_from_variants() {
        let validation = TabulaError::from(ValidationError::NoColumnsProvided);
        assert!(matches!(validation, TabulaError::Validation(_)));

        let storage = TabulaError::from(StorageError::TableNotFound {
            table: "t".to_string(),
        });
        assert!(matches!(storage, TabulaError::Storage(_)));

        let llm = TabulaError::from(LlmError::ProviderNotConfigured {
            capability: "embedding".to_string(),
        });
        assert!(matches!(llm, TabulaError::Llm(_)));

        let config = TabulaError::from(ConfigError::ProviderNotSupported {
            provider: "cohere".to_string(),
        });
        assert!(matches!(config, TabulaError::Config(_)));

        let vector = TabulaError::from(VectorError::InvalidVector {
            reason: "empty".to_string(),
        });
        assert!(matches!(vector, TabulaError::Vector(_)));
    }
}
