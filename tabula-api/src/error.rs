//! Error Types for Tabula API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct carrying a machine code, a message and optional details
//! - ErrorCode enum mapping each failure category to an HTTP status
//! - IntoResponse implementation rendering the `{success: false, ...}` envelope
//! - Conversions from core, database, pool and JSON errors
//!
//! PostgreSQL failures are classified by SQLSTATE so that races the engine
//! cannot rule out up front (a column dropped between introspection and the
//! statement, a concurrent create of the same table) still surface with the
//! right status instead of a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabula_core::{LlmError, StorageError, TabulaError, ValidationError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Table or column name violates the identifier grammar
    InvalidIdentifier,

    /// Column type token is not in the type registry
    UnknownType,

    /// Required field is missing from request
    MissingField,

    /// Row or column set is empty
    NoColumnsProvided,

    /// Bulk insert batch is empty
    NoRowsProvided,

    /// Row references a column the table does not have
    UnknownColumn,

    /// A column name appears twice in one definition
    DuplicateColumnName,

    /// `limit` or `offset` is not a valid non-negative integer
    InvalidPagination,

    /// Name belongs to the engine's own namespace
    ReservedName,

    /// Request contains invalid input data
    InvalidInput,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Table is not managed by the engine
    TableNotFound,

    /// No context descriptor stored for the table
    ContextNotFound,

    /// No row with the requested id
    RowNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Table already exists (or the name is taken by an unmanaged table)
    DuplicateTable,

    /// Table exists with a different column set
    SchemaConflict,

    /// Column already exists on the table
    DuplicateColumn,

    // ========================================================================
    // Server Errors (500, 503, 504)
    // ========================================================================
    /// Any database failure that is not classified above
    StorageError,

    /// Embedding provider failed or returned an unusable vector
    EmbeddingError,

    /// Generation provider failed
    GenerationError,

    /// Other provider failures (missing configuration, rate limits)
    ProviderError,

    /// Internal server error
    InternalError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,

    /// Request took longer than the configured timeout
    Timeout,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidIdentifier
            | ErrorCode::UnknownType
            | ErrorCode::MissingField
            | ErrorCode::NoColumnsProvided
            | ErrorCode::NoRowsProvided
            | ErrorCode::UnknownColumn
            | ErrorCode::DuplicateColumnName
            | ErrorCode::InvalidPagination
            | ErrorCode::ReservedName
            | ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,

            ErrorCode::TableNotFound | ErrorCode::ContextNotFound | ErrorCode::RowNotFound => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::DuplicateTable | ErrorCode::SchemaConflict | ErrorCode::DuplicateColumn => {
                StatusCode::CONFLICT
            }

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::StorageError
            | ErrorCode::EmbeddingError
            | ErrorCode::GenerationError
            | ErrorCode::ProviderError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidIdentifier => "Invalid identifier",
            ErrorCode::UnknownType => "Unknown column type",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::NoColumnsProvided => "No columns provided",
            ErrorCode::NoRowsProvided => "No rows provided",
            ErrorCode::UnknownColumn => "Unknown column",
            ErrorCode::DuplicateColumnName => "Duplicate column name",
            ErrorCode::InvalidPagination => "Invalid pagination parameters",
            ErrorCode::ReservedName => "Name is reserved",
            ErrorCode::InvalidInput => "Invalid input data",

            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::ContextNotFound => "Context not found",
            ErrorCode::RowNotFound => "Row not found",

            ErrorCode::DuplicateTable => "Table already exists",
            ErrorCode::SchemaConflict => "Table exists with a different definition",
            ErrorCode::DuplicateColumn => "Column already exists",

            ErrorCode::StorageError => "Database operation failed",
            ErrorCode::EmbeddingError => "Embedding request failed",
            ErrorCode::GenerationError => "Generation request failed",
            ErrorCode::ProviderError => "Provider request failed",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
            ErrorCode::Timeout => "Request timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error for API operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending field, SQLSTATE, ...)
    pub details: Option<serde_json::Value>,
}

/// Wire shape of every failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ErrorEnvelope {
    /// Always `false`
    pub success: bool,

    /// Human-readable error message
    pub error: String,

    /// Machine-readable error code
    pub code: ErrorCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Render the error as its response envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: self.message.clone(),
            code: self.code,
            details: self.details.clone(),
        }
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidInput,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn invalid_pagination(field: &str, value: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidPagination,
            format!("Invalid {} '{}': {}", field, value, reason),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn reserved_name(name: &str) -> Self {
        Self::new(
            ErrorCode::ReservedName,
            format!("'{}' is reserved for engine bookkeeping", name),
        )
    }

    pub fn table_not_found(table: &str) -> Self {
        StorageError::TableNotFound {
            table: table.to_string(),
        }
        .into()
    }

    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(ErrorCode::Timeout, format!("{} timed out", operation))
    }

    /// Re-tag a provider failure raised while embedding text.
    pub fn embedding(err: TabulaError) -> Self {
        let mut api = ApiError::from(err);
        if matches!(api.code, ErrorCode::ProviderError) {
            api.code = ErrorCode::EmbeddingError;
        }
        api
    }

    /// Re-tag a provider failure raised while generating text.
    pub fn generation(err: TabulaError) -> Self {
        let mut api = ApiError::from(err);
        if matches!(api.code, ErrorCode::ProviderError) {
            api.code = ErrorCode::GenerationError;
        }
        api
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Renders `{success: false, error, code, details?}` with the code's status.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }
        (status, Json(self.envelope())).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::InvalidIdentifier { kind, name, .. } => {
                ApiError::new(ErrorCode::InvalidIdentifier, message)
                    .with_details(serde_json::json!({ "kind": kind.to_string(), "name": name }))
            }
            ValidationError::UnknownType { token } => ApiError::new(ErrorCode::UnknownType, message)
                .with_details(serde_json::json!({ "type": token })),
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            ValidationError::NoColumnsProvided => ApiError::new(ErrorCode::NoColumnsProvided, message),
            ValidationError::NoRowsProvided => ApiError::new(ErrorCode::NoRowsProvided, message),
            ValidationError::UnknownColumn { table, column } => {
                ApiError::new(ErrorCode::UnknownColumn, message)
                    .with_details(serde_json::json!({ "table": table, "column": column }))
            }
            ValidationError::DuplicateColumnName { column } => {
                ApiError::new(ErrorCode::DuplicateColumnName, message)
                    .with_details(serde_json::json!({ "column": column }))
            }
            ValidationError::InvalidValue { field, .. } => {
                ApiError::new(ErrorCode::InvalidInput, message)
                    .with_details(serde_json::json!({ "field": field }))
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        match err {
            StorageError::TableNotFound { .. } => ApiError::new(ErrorCode::TableNotFound, message),
            StorageError::ContextNotFound { .. } => {
                ApiError::new(ErrorCode::ContextNotFound, message)
            }
            StorageError::RowNotFound { .. } => ApiError::new(ErrorCode::RowNotFound, message),
            StorageError::DuplicateTable { .. } => ApiError::new(ErrorCode::DuplicateTable, message),
            StorageError::SchemaConflict { .. } => ApiError::new(ErrorCode::SchemaConflict, message),
            StorageError::DuplicateColumn { .. } => {
                ApiError::new(ErrorCode::DuplicateColumn, message)
            }
            StorageError::UnmappedNativeType { .. } => {
                ApiError::new(ErrorCode::StorageError, message)
            }
            StorageError::QueryFailed { sqlstate, message } => {
                let err = ApiError::new(ErrorCode::StorageError, message);
                match sqlstate {
                    Some(code) => err.with_details(serde_json::json!({ "sqlstate": code })),
                    None => err,
                }
            }
        }
    }
}

impl From<TabulaError> for ApiError {
    fn from(err: TabulaError) -> Self {
        match err {
            TabulaError::Validation(e) => e.into(),
            TabulaError::Storage(e) => e.into(),
            TabulaError::Llm(e) => {
                let message = e.to_string();
                match e {
                    LlmError::RateLimited { retry_after_ms, .. } => {
                        ApiError::new(ErrorCode::ProviderError, message)
                            .with_details(serde_json::json!({ "retryAfterMs": retry_after_ms }))
                    }
                    _ => ApiError::new(ErrorCode::ProviderError, message),
                }
            }
            TabulaError::Vector(e) => ApiError::new(ErrorCode::EmbeddingError, e.to_string()),
            TabulaError::Config(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

/// Map a PostgreSQL SQLSTATE onto the engine's taxonomy.
///
/// Anything without a dedicated mapping is a storage error carrying the
/// database message verbatim.
pub fn classify_sqlstate(sqlstate: &str, message: &str) -> ApiError {
    let code = match sqlstate {
        "42703" => ErrorCode::UnknownColumn,
        "42P01" => ErrorCode::TableNotFound,
        "42P07" => ErrorCode::DuplicateTable,
        "42701" => ErrorCode::DuplicateColumn,
        _ => ErrorCode::StorageError,
    };
    ApiError::new(code, message).with_details(serde_json::json!({ "sqlstate": sqlstate }))
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db_err) => {
                let sqlstate = db_err.code().code();
                tracing::warn!(sqlstate, message = db_err.message(), "Database error");
                classify_sqlstate(sqlstate, db_err.message())
            }
            None if err.is_closed() => {
                tracing::error!("Database connection closed: {:?}", err);
                ApiError::service_unavailable("Database connection closed")
            }
            None => {
                tracing::error!("Database error: {:?}", err);
                ApiError::service_unavailable(format!("Database unavailable: {}", err))
            }
        }
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            deadpool_postgres::PoolError::Backend(e) => e.into(),
            _ => ApiError::service_unavailable("Failed to acquire database connection"),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{IdentifierKind, VectorError};

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidIdentifier.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidPagination.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::TableNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::RowNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::SchemaConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::DuplicateColumn.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::StorageError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::EmbeddingError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ErrorCode::ConnectionPoolExhausted.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_validation_error_mapping() {
        let err: ApiError = ValidationError::InvalidIdentifier {
            kind: IdentifierKind::Table,
            name: "1abc".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvalidIdentifier);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = TabulaError::from(ValidationError::NoRowsProvided).into();
        assert_eq!(err.code, ErrorCode::NoRowsProvided);
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: ApiError = StorageError::RowNotFound {
            table: "travelers".to_string(),
            id: 7,
        }
        .into();
        assert_eq!(err.code, ErrorCode::RowNotFound);
        assert!(err.message.contains("travelers"));

        let err: ApiError = StorageError::QueryFailed {
            sqlstate: Some("22P02".to_string()),
            message: "invalid input syntax for type integer".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::StorageError);
        assert_eq!(err.details, Some(serde_json::json!({ "sqlstate": "22P02" })));
    }

    #[test]
    fn test_classify_sqlstate() {
        assert_eq!(classify_sqlstate("42703", "x").code, ErrorCode::UnknownColumn);
        assert_eq!(classify_sqlstate("42P01", "x").code, ErrorCode::TableNotFound);
        assert_eq!(classify_sqlstate("42P07", "x").code, ErrorCode::DuplicateTable);
        assert_eq!(classify_sqlstate("42701", "x").code, ErrorCode::DuplicateColumn);

        let other = classify_sqlstate("22P02", "invalid input syntax for type integer: \"abc\"");
        assert_eq!(other.code, ErrorCode::StorageError);
        assert!(other.message.contains("invalid input syntax"));
    }

    #[test]
    fn test_provider_errors_retagged() {
        let llm = TabulaError::Llm(LlmError::InvalidResponse {
            provider: "openai".to_string(),
            reason: "empty".to_string(),
        });
        assert_eq!(ApiError::embedding(llm.clone()).code, ErrorCode::EmbeddingError);
        assert_eq!(ApiError::generation(llm).code, ErrorCode::GenerationError);

        let vector = TabulaError::Vector(VectorError::DimensionMismatch {
            expected: 8,
            got: 4,
        });
        assert_eq!(ApiError::generation(vector).code, ErrorCode::EmbeddingError);
    }

    #[test]
    fn test_envelope_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::missing_field("description");
        let json = serde_json::to_value(err.envelope())?;

        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["code"], serde_json::json!("MISSING_FIELD"));
        assert!(json["error"].as_str().unwrap_or_default().contains("description"));
        assert_eq!(json["details"]["field"], serde_json::json!("description"));
        Ok(())
    }

    #[test]
    fn test_envelope_omits_empty_details() -> Result<(), serde_json::Error> {
        let err = ApiError::from_code(ErrorCode::NoRowsProvided);
        let json = serde_json::to_string(&err.envelope())?;
        assert!(!json.contains("details"));
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::storage_error("Connection failed");
        let display = format!("{}", err);
        assert!(display.contains("StorageError"));
        assert!(display.contains("Connection failed"));
    }
}
