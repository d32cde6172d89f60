//! Generic row values for tables whose shape is only known at runtime.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::column_type::ColumnType;

/// A single cell. Reads are tagged by the stored column type; writes are
/// tagged by the JSON shape of the request.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Text form bound as a statement parameter for a column of `column_type`.
    ///
    /// `None` binds SQL NULL. The database performs the actual coercion via
    /// `CAST`, so a value that does not fit the column is rejected there.
    pub fn to_bind_text(&self, column_type: ColumnType) -> Option<String> {
        match (self, column_type) {
            (CellValue::Null, _) => None,
            (CellValue::Json(v), _) => Some(v.to_string()),
            (CellValue::Text(s), ColumnType::Json) => Some(JsonValue::String(s.clone()).to_string()),
            (CellValue::Text(s), _) => Some(s.clone()),
            (CellValue::Integer(v), _) => Some(v.to_string()),
            (CellValue::Real(v), _) => Some(v.to_string()),
            (CellValue::Boolean(v), _) => Some(v.to_string()),
            (CellValue::Timestamp(ts), ColumnType::Json) => {
                Some(JsonValue::String(format_timestamp(ts)).to_string())
            }
            (CellValue::Timestamp(ts), _) => Some(format_timestamp(ts)),
        }
    }

    /// JSON rendering used in API responses.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::Integer(v) => JsonValue::from(*v),
            CellValue::Real(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Text(v) => JsonValue::String(v.clone()),
            CellValue::Boolean(v) => JsonValue::Bool(*v),
            CellValue::Timestamp(ts) => JsonValue::String(format_timestamp(ts)),
            CellValue::Json(v) => v.clone(),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n
                    .as_f64()
                    .map(CellValue::Real)
                    .unwrap_or_else(|| CellValue::Text(n.to_string())),
            },
            JsonValue::String(s) => CellValue::Text(s),
            other => CellValue::Json(other),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(CellValue::from)
    }
}

/// One row: column names mapped to cells, in column order.
///
/// Deserialization keeps the order keys appear in the request document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column`, replacing an earlier value for the same column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Surrogate key, when the row was read back from storage.
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(CellValue::as_i64)
    }
}

impl FromIterator<(String, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping column names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((column, value)) = access.next_entry::<String, CellValue>()? {
                    row.insert(column, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_row_preserves_document_order() -> Result<(), serde_json::Error> {
        let row: Row = serde_json::from_str(r#"{"zeta":1,"alpha":"a","mid":null}"#)?;
        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["zeta", "alpha", "mid"]);
        assert_eq!(row.get("zeta"), Some(&CellValue::Integer(1)));
        assert_eq!(row.get("mid"), Some(&CellValue::Null));
        Ok(())
    }

    #[test]
    fn test_row_serializes_as_object() -> Result<(), serde_json::Error> {
        let row = Row::new().with("id", 7i64).with("name", "Ada");
        assert_eq!(serde_json::to_value(&row)?, json!({"id": 7, "name": "Ada"}));
        assert_eq!(row.id(), Some(7));
        Ok(())
    }

    #[test]
    fn test_insert_replaces_existing_column() {
        let mut row = Row::new().with("a", 1i64);
        row.insert("a", 2i64);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("a"), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn test_cell_from_json_shapes() {
        assert_eq!(CellValue::from(json!(null)), CellValue::Null);
        assert_eq!(CellValue::from(json!(3)), CellValue::Integer(3));
        assert_eq!(CellValue::from(json!(2.5)), CellValue::Real(2.5));
        assert_eq!(CellValue::from(json!(true)), CellValue::Boolean(true));
        assert_eq!(CellValue::from(json!("x")), CellValue::Text("x".to_string()));
        assert_eq!(
            CellValue::from(json!({"k": [1]})),
            CellValue::Json(json!({"k": [1]}))
        );
    }

    #[test]
    fn test_bind_text_per_column_type() {
        assert_eq!(CellValue::Null.to_bind_text(ColumnType::Integer), None);
        assert_eq!(
            CellValue::Integer(30).to_bind_text(ColumnType::Integer),
            Some("30".to_string())
        );
        assert_eq!(
            CellValue::Text("30".to_string()).to_bind_text(ColumnType::Integer),
            Some("30".to_string())
        );
        assert_eq!(
            CellValue::Boolean(false).to_bind_text(ColumnType::Boolean),
            Some("false".to_string())
        );
        assert_eq!(
            CellValue::Text("hello".to_string()).to_bind_text(ColumnType::Json),
            Some("\"hello\"".to_string())
        );
        assert_eq!(
            CellValue::Json(json!({"a": 1})).to_bind_text(ColumnType::Json),
            Some(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn test_timestamp_renders_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        let cell = ts.map(CellValue::Timestamp).unwrap_or(CellValue::Null);
        assert_eq!(cell.to_json(), json!("2024-05-01T12:30:00Z"));
        assert_eq!(
            cell.to_bind_text(ColumnType::Timestamp),
            Some("2024-05-01T12:30:00Z".to_string())
        );
    }

    #[test]
    fn test_non_finite_real_renders_null() {
        assert_eq!(CellValue::Real(f64::NAN).to_json(), JsonValue::Null);
    }
}
