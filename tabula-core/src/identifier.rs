//! Identifier grammar for user-supplied table and column names.
//!
//! Every name that ends up inside generated SQL passes through here first.
//! The grammar is closed (`^[A-Za-z_][A-Za-z0-9_]*$`, at most 63 bytes), so a
//! validated name can be quoted and spliced into a statement without further
//! escaping. Values never go through this path; they are always bound.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IdentifierKind, ValidationError};

/// PostgreSQL truncates identifiers beyond `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Columns every managed table carries. Users can neither declare nor write them.
pub const ENGINE_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Registry of tables created through the schema manager.
pub const MANAGED_TABLES_TABLE: &str = "_tabula_tables";

/// One context descriptor per managed table.
pub const CONTEXTS_TABLE: &str = "_tabula_contexts";

/// Shared trigger function that refreshes `updated_at`.
pub const TOUCH_FUNCTION: &str = "_tabula_touch_updated_at";

/// Name of the per-table trigger installed on every managed table.
pub const TOUCH_TRIGGER: &str = "_tabula_touch_updated_at";

const RESERVED_PREFIXES: [&str; 2] = ["_tabula", "pg_"];

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

static IDENTIFIER_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(IDENTIFIER_PATTERN));

fn invalid(kind: IdentifierKind, name: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidIdentifier {
        kind,
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Check `name` against the identifier grammar and return it unchanged.
pub fn validate_identifier(kind: IdentifierKind, name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(invalid(kind, name, "must not be empty"));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid(
            kind,
            name,
            format!("must be at most {} bytes", MAX_IDENTIFIER_LEN),
        ));
    }

    let re = IDENTIFIER_RE
        .as_ref()
        .map_err(|e| invalid(kind, name, format!("identifier grammar unavailable: {}", e)))?;
    if !re.is_match(name) {
        return Err(invalid(
            kind,
            name,
            "must start with a letter or underscore and contain only letters, digits and underscores",
        ));
    }

    Ok(name)
}

/// Validate a table name.
pub fn validate_table_name(name: &str) -> Result<&str, ValidationError> {
    validate_identifier(IdentifierKind::Table, name)
}

/// Validate a user column name. Engine-owned columns are rejected here.
pub fn validate_column_name(name: &str) -> Result<&str, ValidationError> {
    validate_identifier(IdentifierKind::Column, name)?;
    if is_engine_column(name) {
        return Err(invalid(
            IdentifierKind::Column,
            name,
            "is managed by the engine",
        ));
    }
    Ok(name)
}

/// Whether `name` is one of the engine-owned audit columns (case-insensitive).
pub fn is_engine_column(name: &str) -> bool {
    ENGINE_COLUMNS
        .iter()
        .any(|column| column.eq_ignore_ascii_case(name))
}

/// Whether `name` belongs to the engine's own namespace.
pub fn is_reserved_table_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Quote a validated identifier for inclusion in SQL.
///
/// Callers must have passed `name` through [`validate_identifier`]; the
/// grammar excludes `"` so no escaping is needed.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}
