//! Closed set of column types and their PostgreSQL storage mapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Column types a dynamic table may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// Short text, `VARCHAR(255)`
    Varchar,
    /// Unbounded text
    Text,
    /// 32-bit integer
    Integer,
    /// Double precision floating point
    Float,
    Boolean,
    /// Timestamp with time zone
    Timestamp,
    /// Unstructured JSON, stored as `JSONB`
    Json,
}

impl ColumnType {
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Varchar,
        ColumnType::Text,
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Boolean,
        ColumnType::Timestamp,
        ColumnType::Json,
    ];

    /// Resolve a user-supplied type token (case-insensitive, aliases accepted).
    pub fn resolve(token: &str) -> Result<Self, ValidationError> {
        let normalized = token.trim().to_ascii_uppercase();
        let resolved = match normalized.as_str() {
            "VARCHAR" | "STRING" | "SHORT_TEXT" => ColumnType::Varchar,
            "TEXT" => ColumnType::Text,
            "INTEGER" | "INT" => ColumnType::Integer,
            "FLOAT" | "REAL" | "DOUBLE" | "DECIMAL" | "NUMERIC" => ColumnType::Float,
            "BOOLEAN" | "BOOL" => ColumnType::Boolean,
            "TIMESTAMP" | "DATETIME" => ColumnType::Timestamp,
            "JSON" | "JSONB" => ColumnType::Json,
            _ => {
                return Err(ValidationError::UnknownType {
                    token: token.to_string(),
                })
            }
        };
        Ok(resolved)
    }

    /// Canonical token, as reported by schema introspection.
    pub fn token(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Json => "JSON",
        }
    }

    /// Type used in `CREATE TABLE` / `ALTER TABLE` column definitions.
    pub fn native_type(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR(255)",
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMPTZ",
            ColumnType::Json => "JSONB",
        }
    }

    /// Target of the `CAST($n AS ...)` applied to bound text values.
    ///
    /// Varchar casts to unbounded `VARCHAR` so over-long input is rejected by
    /// the column constraint instead of being silently truncated by the cast.
    pub fn cast_type(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            other => other.native_type(),
        }
    }

    /// Map `information_schema.columns.data_type` back to a column type.
    pub fn from_native(data_type: &str) -> Option<Self> {
        match data_type {
            "character varying" => Some(ColumnType::Varchar),
            "text" => Some(ColumnType::Text),
            "integer" => Some(ColumnType::Integer),
            "double precision" => Some(ColumnType::Float),
            "boolean" => Some(ColumnType::Boolean),
            "timestamp with time zone" => Some(ColumnType::Timestamp),
            "jsonb" => Some(ColumnType::Json),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ColumnType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::resolve(s)
    }
}
