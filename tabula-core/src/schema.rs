//! Table and column descriptors for runtime-defined tables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::column_type::ColumnType;
use crate::error::ValidationError;
use crate::identifier::{validate_column_name, validate_table_name};

/// A user column of a dynamic table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }

    /// Nullable column of the given type.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, true)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_column_name(&self.name)?;
        Ok(())
    }
}

/// Requested shape of a table: its name and ordered user columns.
///
/// The engine-owned `id`, `created_at` and `updated_at` columns are implied
/// and never appear in `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// Validate the table name, every column name, and column uniqueness.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_table_name(&self.table_name)?;
        if self.columns.is_empty() {
            return Err(ValidationError::NoColumnsProvided);
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            column.validate()?;
            if !seen.insert(column.name.as_str()) {
                return Err(ValidationError::DuplicateColumnName {
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether two descriptors declare the same set of columns.
    ///
    /// Column order is ignored; names, types and nullability must match.
    pub fn same_shape(&self, other: &TableDescriptor) -> bool {
        if self.columns.len() != other.columns.len() {
            return false;
        }
        self.columns
            .iter()
            .all(|column| other.column(&column.name) == Some(column))
    }

    /// Human-readable description of how `other` differs from `self`.
    pub fn shape_difference(&self, other: &TableDescriptor) -> Option<String> {
        if self.same_shape(other) {
            return None;
        }
        let missing: Vec<&str> = other
            .columns
            .iter()
            .filter(|c| self.column(&c.name) != Some(*c))
            .map(|c| c.name.as_str())
            .collect();
        let extra: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| other.column(&c.name) != Some(*c))
            .map(|c| c.name.as_str())
            .collect();
        Some(format!(
            "existing columns differ on [{}], requested columns differ on [{}]",
            extra.join(", "),
            missing.join(", ")
        ))
    }
}

/// Live shape of a materialized table, as read back from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// False when the table exists but its `updated_at` trigger is missing.
    pub update_trigger_installed: bool,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn descriptor(&self) -> TableDescriptor {
        TableDescriptor::new(self.table_name.clone(), self.columns.clone())
    }
}
