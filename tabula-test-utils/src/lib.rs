//! Tabula Test Utilities
//!
//! Centralized test infrastructure for the Tabula workspace:
//! - Proptest generators for identifiers, column types, table shapes and rows
//! - Test fixtures for common scenarios
//! - Custom assertions for Tabula-specific errors

// Re-export core types for convenience
pub use tabula_core::{
    CellValue, ColumnDescriptor, ColumnType, ContextDescriptor, EmbeddingVector, Row,
    StorageError, TableDescriptor, TabulaError, TabulaResult, ValidationError, VectorError,
};
pub use tabula_llm::{MockEmbeddingProvider, MockGenerationProvider, ProviderRegistry};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Tabula schema and row values.

    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use tabula_core::{is_engine_column, is_reserved_table_name};

    // === Identifier Generators ===

    /// A table name inside the identifier grammar and outside the engine's
    /// reserved namespace.
    pub fn arb_table_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,30}".prop_filter("reserved table name", |name| {
            !is_reserved_table_name(name)
        })
    }

    /// A user column name (never one of the engine-owned columns).
    pub fn arb_column_name() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_]{0,30}".prop_filter("engine column", |name| !is_engine_column(name))
    }

    /// A name that violates the identifier grammar.
    pub fn arb_invalid_identifier() -> impl Strategy<Value = String> {
        prop_oneof![
            // Leading digit
            "[0-9][a-z0-9_]{0,20}",
            // SQL metacharacters
            ("[a-z_]{1,10}", "[-; .'\"()*/=]", "[a-z0-9_]{0,10}")
                .prop_map(|(head, bad, tail)| format!("{}{}{}", head, bad, tail)),
            // Too long
            "[a-z]{64,80}",
            Just(String::new()),
        ]
    }

    // === Type Generators ===

    pub fn arb_column_type() -> impl Strategy<Value = ColumnType> {
        prop::sample::select(ColumnType::ALL.to_vec())
    }

    /// A user-facing type token together with the type it must resolve to,
    /// in arbitrary letter case.
    pub fn arb_type_token() -> impl Strategy<Value = (String, ColumnType)> {
        let tokens = vec![
            ("varchar", ColumnType::Varchar),
            ("string", ColumnType::Varchar),
            ("text", ColumnType::Text),
            ("integer", ColumnType::Integer),
            ("int", ColumnType::Integer),
            ("float", ColumnType::Float),
            ("double", ColumnType::Float),
            ("numeric", ColumnType::Float),
            ("boolean", ColumnType::Boolean),
            ("bool", ColumnType::Boolean),
            ("timestamp", ColumnType::Timestamp),
            ("datetime", ColumnType::Timestamp),
            ("json", ColumnType::Json),
            ("jsonb", ColumnType::Json),
        ];
        (prop::sample::select(tokens), any::<u64>()).prop_map(|((token, column_type), mask)| {
            let mixed: String = token
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    if mask & (1 << (i % 64)) != 0 {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    }
                })
                .collect();
            (mixed, column_type)
        })
    }

    // === Schema Generators ===

    pub fn arb_column_descriptor() -> impl Strategy<Value = ColumnDescriptor> {
        (arb_column_name(), arb_column_type(), any::<bool>())
            .prop_map(|(name, column_type, nullable)| ColumnDescriptor::new(name, column_type, nullable))
    }

    /// A valid table descriptor: 1..=8 columns with distinct names.
    pub fn arb_table_descriptor() -> impl Strategy<Value = TableDescriptor> {
        (
            arb_table_name(),
            prop::collection::btree_map(arb_column_name(), (arb_column_type(), any::<bool>()), 1..=8),
        )
            .prop_map(|(table, columns)| {
                let columns = columns
                    .into_iter()
                    .map(|(name, (column_type, nullable))| {
                        ColumnDescriptor::new(name, column_type, nullable)
                    })
                    .collect();
                TableDescriptor::new(table, columns)
            })
    }

    // === Value Generators ===

    /// A timestamp between 1970 and 2100, truncated to microseconds so it
    /// survives a round trip through `TIMESTAMPTZ`.
    pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..4_102_444_800, 0u32..1_000_000).prop_map(|(secs, micros)| {
            Utc.timestamp_opt(secs, micros * 1_000)
                .single()
                .unwrap_or_default()
        })
    }

    /// A small JSON object.
    pub fn arb_json_object() -> impl Strategy<Value = serde_json::Value> {
        prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..4).prop_map(|entries| {
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            )
        })
    }

    /// A non-null value that PostgreSQL stores unchanged in a column of
    /// `column_type`.
    pub fn arb_cell_value(column_type: ColumnType) -> BoxedStrategy<CellValue> {
        match column_type {
            ColumnType::Varchar => "[a-zA-Z0-9 ]{0,64}".prop_map(CellValue::Text).boxed(),
            ColumnType::Text => "[a-zA-Z0-9 .,!?]{0,256}".prop_map(CellValue::Text).boxed(),
            ColumnType::Integer => any::<i32>()
                .prop_map(|v| CellValue::Integer(i64::from(v)))
                .boxed(),
            ColumnType::Float => (-1.0e9f64..1.0e9f64).prop_map(CellValue::Real).boxed(),
            ColumnType::Boolean => any::<bool>().prop_map(CellValue::Boolean).boxed(),
            ColumnType::Timestamp => arb_timestamp().prop_map(CellValue::Timestamp).boxed(),
            ColumnType::Json => arb_json_object().prop_map(CellValue::Json).boxed(),
        }
    }

    /// A row with a value for every column of `table`.
    pub fn arb_full_row(table: &TableDescriptor) -> impl Strategy<Value = Row> {
        let cells: Vec<_> = table
            .columns
            .iter()
            .map(|column| {
                let name = column.name.clone();
                arb_cell_value(column.column_type).prop_map(move |value| (name.clone(), value))
            })
            .collect();
        cells.prop_map(|cells| cells.into_iter().collect::<Row>())
    }

    /// A row over a non-empty subset of the nullable columns of `table`.
    /// Columns left out are stored as NULL.
    pub fn arb_partial_row(table: &TableDescriptor) -> BoxedStrategy<Row> {
        let full = arb_full_row(table);
        let required: Vec<String> = table
            .columns
            .iter()
            .filter(|c| !c.nullable)
            .map(|c| c.name.clone())
            .collect();
        let width = table.columns.len().max(1);

        (full, prop::collection::vec(any::<bool>(), width))
            .prop_map(move |(row, keep)| {
                let mut kept: Row = row
                    .iter()
                    .zip(keep.iter().chain(std::iter::repeat(&true)))
                    .filter(|((name, _), keep)| **keep || required.iter().any(|r| r == name))
                    .map(|((name, value), _)| (name.to_string(), value.clone()))
                    .collect();
                if kept.is_empty() {
                    if let Some((name, value)) = row.iter().next() {
                        kept.insert(name, value.clone());
                    }
                }
                kept
            })
            .boxed()
    }

    // === Embedding Generators ===

    /// Generate an EmbeddingVector with specified dimensions and a non-zero
    /// norm.
    pub fn arb_embedding_vector(dimensions: usize) -> impl Strategy<Value = EmbeddingVector> {
        (
            prop::collection::vec(-1.0f32..1.0f32, dimensions),
            "[a-z]{3,10}",
        )
            .prop_filter("zero vector", |(data, _)| data.iter().any(|x| x.abs() > 1e-3))
            .prop_map(|(data, model_id)| EmbeddingVector::new(data, model_id))
    }

    /// Generate an EmbeddingVector with random dimensions (2-64).
    pub fn arb_embedding_vector_any() -> impl Strategy<Value = EmbeddingVector> {
        (2usize..64).prop_flat_map(arb_embedding_vector)
    }

    /// Free-text descriptions with a few words each.
    pub fn arb_description() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{3,10}", 1..8).prop_map(|words| words.join(" "))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Width of the embeddings produced by [`mock_providers`].
    pub const MOCK_DIMENSIONS: i32 = 64;

    static TABLE_COUNTER: AtomicU64 = AtomicU64::new(0);

    /// A table name unique across test processes sharing one database.
    pub fn unique_table_name(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() % 1_000_000_000_000)
            .unwrap_or_default();
        let n = TABLE_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}_{}_{}", prefix, std::process::id(), nanos, n)
    }

    /// The `travelers` table used across examples: a required integer and
    /// an optional short name.
    pub fn travelers_table(table_name: &str) -> TableDescriptor {
        TableDescriptor::new(
            table_name,
            vec![
                ColumnDescriptor::nullable("name", ColumnType::Varchar),
                ColumnDescriptor::new("age", ColumnType::Integer, false),
            ],
        )
    }

    pub fn traveler(name: &str, age: i64) -> Row {
        Row::new().with("name", name).with("age", age)
    }

    /// A table with one column of every registered type, all nullable.
    pub fn every_type_table(table_name: &str) -> TableDescriptor {
        let columns = ColumnType::ALL
            .iter()
            .map(|t| ColumnDescriptor::nullable(format!("c_{}", t.token().to_lowercase()), *t))
            .collect();
        TableDescriptor::new(table_name, columns)
    }

    /// Provider registry backed by deterministic mocks.
    pub fn mock_providers() -> ProviderRegistry {
        let mut providers = ProviderRegistry::new();
        providers.register_embedding(Box::new(MockEmbeddingProvider::new(
            "mock-embedding",
            MOCK_DIMENSIONS,
        )));
        providers.register_generation(Box::new(MockGenerationProvider::new()));
        providers
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over Tabula results.

    use super::*;

    /// Assert that a result is Ok.
    pub fn assert_ok<T: std::fmt::Debug>(result: &TabulaResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got {:?}", result);
    }

    /// Assert that a result is a validation error.
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &TabulaResult<T>) {
        assert!(
            matches!(result, Err(TabulaError::Validation(_))),
            "Expected ValidationError, got {:?}",
            result
        );
    }

    /// Assert that a result rejects an identifier.
    pub fn assert_invalid_identifier<T: std::fmt::Debug>(result: &TabulaResult<T>) {
        assert!(
            matches!(
                result,
                Err(TabulaError::Validation(ValidationError::InvalidIdentifier { .. }))
            ),
            "Expected InvalidIdentifier, got {:?}",
            result
        );
    }

    /// Assert that a result is a storage error.
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &TabulaResult<T>) {
        assert!(
            matches!(result, Err(TabulaError::Storage(_))),
            "Expected StorageError, got {:?}",
            result
        );
    }

    /// Assert that a result is a dimension mismatch error.
    pub fn assert_dimension_mismatch<T: std::fmt::Debug>(
        result: &TabulaResult<T>,
        expected: i32,
        got: i32,
    ) {
        match result {
            Err(TabulaError::Vector(VectorError::DimensionMismatch {
                expected: e,
                got: g,
            })) => {
                assert_eq!(*e, expected, "Expected dimension mismatch with expected={}", expected);
                assert_eq!(*g, got, "Expected dimension mismatch with got={}", got);
            }
            _ => panic!("Expected DimensionMismatch, got {:?}", result),
        }
    }

    /// Assert that an embedding is usable for ranking.
    pub fn assert_valid_embedding(embedding: &EmbeddingVector) {
        assert!(!embedding.data.is_empty(), "Embedding is empty");
        assert_eq!(
            embedding.data.len(),
            embedding.dimensions as usize,
            "Embedding dimensions field does not match data length"
        );
        assert!(
            embedding.data.iter().all(|x| x.is_finite()),
            "Embedding contains non-finite values"
        );
    }

    /// Assert that two rows carry equal values for every column of `expected`.
    pub fn assert_row_contains(actual: &Row, expected: &Row) {
        for (column, value) in expected.iter() {
            assert_eq!(
                actual.get(column),
                Some(value),
                "Column '{}' differs; stored row: {:?}",
                column,
                actual
            );
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
