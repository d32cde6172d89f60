//! Statement builders for runtime-defined tables.
//!
//! Every function here takes names that already passed the identifier
//! validator and returns SQL text. Identifiers are always double-quoted;
//! values are never interpolated, only placeholders are emitted. The single
//! exception is `LIMIT`/`OFFSET`, which are typed integers by construction.

use tabula_core::{
    quote_ident, ColumnDescriptor, ColumnType, TableDescriptor, CONTEXTS_TABLE,
    MANAGED_TABLES_TABLE, TOUCH_FUNCTION, TOUCH_TRIGGER,
};

/// A column targeted by a write, with the type its value is cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteColumn<'a> {
    pub name: &'a str,
    pub column_type: ColumnType,
}

/// Engine bookkeeping: registry table, contexts table and the shared trigger
/// function. Serialized with an advisory lock so concurrent starts do not
/// trip over each other's catalog updates.
pub fn bootstrap() -> String {
    format!(
        r#"BEGIN;
SELECT pg_advisory_xact_lock(hashtext('{registry}'));
CREATE TABLE IF NOT EXISTS {registry_q} (
    table_name TEXT PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS {contexts_q} (
    table_name TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    embedding REAL[] NOT NULL,
    model_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE OR REPLACE FUNCTION {function_q}() RETURNS trigger
LANGUAGE plpgsql AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$;
COMMIT;"#,
        registry = MANAGED_TABLES_TABLE,
        registry_q = quote_ident(MANAGED_TABLES_TABLE),
        contexts_q = quote_ident(CONTEXTS_TABLE),
        function_q = quote_ident(TOUCH_FUNCTION),
    )
}

fn column_definition(column: &ColumnDescriptor) -> String {
    let mut def = format!(
        "{} {}",
        quote_ident(&column.name),
        column.column_type.native_type()
    );
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    def
}

/// `CREATE TABLE IF NOT EXISTS` with the engine-owned columns first.
pub fn create_table(table: &TableDescriptor) -> String {
    let mut columns = vec![
        "\"id\" BIGSERIAL PRIMARY KEY".to_string(),
        "\"created_at\" TIMESTAMPTZ NOT NULL DEFAULT now()".to_string(),
        "\"updated_at\" TIMESTAMPTZ NOT NULL DEFAULT now()".to_string(),
    ];
    columns.extend(table.columns.iter().map(column_definition));

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&table.table_name),
        columns.join(", ")
    )
}

/// Install (or repair) the `updated_at` trigger on `table`.
pub fn install_touch_trigger(table: &str) -> String {
    format!(
        "CREATE OR REPLACE TRIGGER {} BEFORE UPDATE ON {} FOR EACH ROW EXECUTE FUNCTION {}()",
        quote_ident(TOUCH_TRIGGER),
        quote_ident(table),
        quote_ident(TOUCH_FUNCTION)
    )
}

pub fn add_column(table: &str, column: &ColumnDescriptor) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_ident(table),
        column_definition(column)
    )
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

/// Placeholder `$index` bound as text and cast to the column's type.
///
/// The inner `::TEXT` pins the parameter type so the driver always sends
/// text; the outer cast hands coercion to PostgreSQL.
pub fn cast_placeholder(index: usize, column_type: ColumnType) -> String {
    format!("CAST(${}::TEXT AS {})", index, column_type.cast_type())
}

/// Multi-row insert returning stored rows in `VALUES` order.
///
/// Placeholders are numbered row-major: row `r`, column `c` binds
/// `$(r * columns.len() + c + 1)`.
pub fn insert_rows(table: &str, columns: &[WriteColumn<'_>], row_count: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let tuples = (0..row_count)
        .map(|row| {
            let values = columns
                .iter()
                .enumerate()
                .map(|(col, c)| cast_placeholder(row * columns.len() + col + 1, c.column_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", values)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "WITH inserted AS (INSERT INTO {} ({}) VALUES {} RETURNING *) \
         SELECT * FROM inserted ORDER BY \"id\" ASC",
        quote_ident(table),
        column_list,
        tuples
    )
}

pub fn select_page(table: &str, limit: i64, offset: i64) -> String {
    format!(
        "SELECT * FROM {} ORDER BY \"id\" ASC LIMIT {} OFFSET {}",
        quote_ident(table),
        limit,
        offset
    )
}

pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

/// Update keyed by id; the id binds to the placeholder after the values.
pub fn update_by_id(table: &str, columns: &[WriteColumn<'_>]) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = {}", quote_ident(c.name), cast_placeholder(i + 1, c.column_type)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE {} SET {} WHERE \"id\" = ${} RETURNING *",
        quote_ident(table),
        assignments,
        columns.len() + 1
    )
}

pub fn delete_by_id(table: &str) -> String {
    format!("DELETE FROM {} WHERE \"id\" = $1", quote_ident(table))
}

// ============================================================================
// CATALOG QUERIES
// ============================================================================

pub fn table_exists() -> &'static str {
    "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = $1)"
}

pub fn is_registered() -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE table_name = $1)",
        quote_ident(MANAGED_TABLES_TABLE)
    )
}

/// Registered through the engine and still materialized.
pub fn is_managed() -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {} m \
         JOIN information_schema.tables t \
           ON t.table_schema = current_schema() AND t.table_name = m.table_name \
         WHERE m.table_name = $1)",
        quote_ident(MANAGED_TABLES_TABLE)
    )
}

pub fn register_table() -> String {
    format!(
        "INSERT INTO {} (table_name) VALUES ($1) ON CONFLICT (table_name) DO NOTHING",
        quote_ident(MANAGED_TABLES_TABLE)
    )
}

pub fn unregister_table() -> String {
    format!(
        "DELETE FROM {} WHERE table_name = $1",
        quote_ident(MANAGED_TABLES_TABLE)
    )
}

/// Registered tables that are still materialized, sorted by name.
pub fn list_managed_tables() -> String {
    format!(
        "SELECT m.table_name FROM {} m \
         JOIN information_schema.tables t \
           ON t.table_schema = current_schema() AND t.table_name = m.table_name \
         ORDER BY m.table_name",
        quote_ident(MANAGED_TABLES_TABLE)
    )
}

pub fn describe_columns() -> &'static str {
    "SELECT column_name::TEXT, data_type::TEXT, is_nullable::TEXT \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 \
     ORDER BY ordinal_position"
}

pub fn trigger_installed() -> &'static str {
    "SELECT EXISTS (SELECT 1 FROM pg_trigger t \
     JOIN pg_class c ON c.oid = t.tgrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     WHERE n.nspname = current_schema() AND c.relname = $1 \
       AND t.tgname = $2 AND NOT t.tgisinternal)"
}

// ============================================================================
// CONTEXT DESCRIPTORS
// ============================================================================

const CONTEXT_COLUMNS: &str =
    "table_name, description, embedding, model_id, created_at, updated_at";

pub fn upsert_context() -> String {
    format!(
        "INSERT INTO {} (table_name, description, embedding, model_id) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (table_name) DO UPDATE SET \
           description = EXCLUDED.description, \
           embedding = EXCLUDED.embedding, \
           model_id = EXCLUDED.model_id, \
           updated_at = now() \
         RETURNING {}",
        quote_ident(CONTEXTS_TABLE),
        CONTEXT_COLUMNS
    )
}

pub fn get_context() -> String {
    format!(
        "SELECT {} FROM {} WHERE table_name = $1",
        CONTEXT_COLUMNS,
        quote_ident(CONTEXTS_TABLE)
    )
}

pub fn list_contexts() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY table_name",
        CONTEXT_COLUMNS,
        quote_ident(CONTEXTS_TABLE)
    )
}

/// Distinct embedding widths stored for every table except `$1`.
pub fn other_context_dimensions() -> String {
    format!(
        "SELECT DISTINCT cardinality(embedding)::INT4 FROM {} WHERE table_name <> $1",
        quote_ident(CONTEXTS_TABLE)
    )
}

pub fn delete_context() -> String {
    format!(
        "DELETE FROM {} WHERE table_name = $1",
        quote_ident(CONTEXTS_TABLE)
    )
}
