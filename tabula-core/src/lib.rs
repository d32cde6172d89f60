//! Tabula Core - Dynamic Schema Types
//!
//! Pure data types and checks shared by every other crate: the identifier
//! grammar, the closed column type registry, table descriptors, generic
//! row values, context descriptors and embedding ranking.
//! This crate performs no I/O.

pub mod column_type;
pub mod context;
pub mod embedding;
pub mod error;
pub mod identifier;
pub mod schema;
pub mod value;

pub use column_type::ColumnType;
pub use context::ContextDescriptor;
pub use embedding::{rank_by_distance, EmbeddingVector, Ranked};
pub use error::{
    ConfigError, IdentifierKind, LlmError, StorageError, TabulaError, TabulaResult,
    ValidationError, VectorError,
};
pub use identifier::{
    is_engine_column, is_reserved_table_name, quote_ident, validate_column_name,
    validate_identifier, validate_table_name, CONTEXTS_TABLE, ENGINE_COLUMNS,
    MANAGED_TABLES_TABLE, MAX_IDENTIFIER_LEN, TOUCH_FUNCTION, TOUCH_TRIGGER,
};
pub use schema::{ColumnDescriptor, TableDescriptor, TableSchema};
pub use value::{CellValue, Row};
