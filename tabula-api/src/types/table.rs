//! Table definition API types

use serde::{Deserialize, Serialize};
use tabula_core::{ColumnDescriptor, ColumnType, TableDescriptor};

use crate::error::{ApiError, ApiResult};
use crate::validation::ValidateNonEmpty;

/// A column as submitted by a client. The type is a free-form token
/// resolved against the type registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ColumnDefinition {
    /// Column name
    pub name: Option<String>,
    /// Type token, e.g. `INTEGER`, `string`, `jsonb`
    #[serde(rename = "type")]
    pub column_type: Option<String>,
    /// Defaults to true
    pub nullable: Option<bool>,
}

impl ColumnDefinition {
    pub fn into_descriptor(self) -> ApiResult<ColumnDescriptor> {
        self.name.validate_non_empty("name")?;
        self.column_type.validate_non_empty("type")?;
        let (Some(name), Some(token)) = (self.name, self.column_type) else {
            return Err(ApiError::missing_field("name"));
        };
        let column_type = ColumnType::resolve(&token)?;
        Ok(ColumnDescriptor::new(
            name,
            column_type,
            self.nullable.unwrap_or(true),
        ))
    }
}

/// Request to create a new table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub table_name: Option<String>,
    pub columns: Option<Vec<ColumnDefinition>>,
}

impl CreateTableRequest {
    /// Resolve type tokens and produce a descriptor. Identifier and
    /// uniqueness checks happen when the descriptor is validated.
    pub fn into_descriptor(self) -> ApiResult<TableDescriptor> {
        self.table_name.validate_non_empty("tableName")?;
        let table_name = self.table_name.unwrap_or_default();
        let columns = self
            .columns
            .ok_or_else(|| ApiError::missing_field("columns"))?
            .into_iter()
            .map(ColumnDefinition::into_descriptor)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(TableDescriptor::new(table_name, columns))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableResponse {
    pub table_name: String,
    /// False when an identical table already existed
    pub created: bool,
}

/// Request to append one column to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlterTableRequest {
    pub table_name: Option<String>,
    pub column_name: Option<String>,
    pub column_type: Option<String>,
    /// Defaults to true
    pub nullable: Option<bool>,
}

impl AlterTableRequest {
    pub fn into_parts(self) -> ApiResult<(String, ColumnDescriptor)> {
        self.table_name.validate_non_empty("tableName")?;
        self.column_name.validate_non_empty("columnName")?;
        self.column_type.validate_non_empty("columnType")?;
        let column = ColumnDefinition {
            name: self.column_name,
            column_type: self.column_type,
            nullable: self.nullable,
        }
        .into_descriptor()?;
        Ok((self.table_name.unwrap_or_default(), column))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ListTablesResponse {
    pub tables: Vec<String>,
}
