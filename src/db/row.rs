//! Result rows decoded into JSON values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::db::vector::PgVector;
use crate::error::StoreError;

/// A single row from a query result.
///
/// Column values are held as JSON; use [`Row::get`] for typed extraction.
#[derive(Debug, Clone, Default)]
pub struct Row {
    data: HashMap<String, JsonValue>,
}

impl Row {
    pub fn new(data: HashMap<String, JsonValue>) -> Self {
        Self { data }
    }

    /// Gets a column value, deserializing to the requested type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the column is missing or has the
    /// wrong shape.
    ///
    /// ```ignore
    /// let id: String = row.get("id")?;
    /// let embedding: Vec<f32> = row.get("embedding")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        self.data
            .get(key)
            .ok_or_else(|| StoreError::Decode(format!("column not found: {}", key)))
            .and_then(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| StoreError::Decode(format!("failed to deserialize '{}': {}", key, e)))
            })
    }

    /// Gets a column value, returning `None` when missing or NULL.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.data.get(key) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| StoreError::Decode(format!("failed to deserialize '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(data: HashMap<String, JsonValue>) -> Self {
        Self::new(data)
    }
}

/// Converts a PostgreSQL row into a [`Row`].
///
/// pgvector columns become float arrays and `timestamptz` columns become
/// RFC 3339 strings. Unreadable values decode as NULL.
pub fn parse_pg_row(pg_row: &tokio_postgres::Row) -> Row {
    let mut data = HashMap::new();

    for (idx, column) in pg_row.columns().iter().enumerate() {
        let name = column.name().to_string();

        let value = match column.type_().name() {
            "int2" => pg_row
                .try_get::<_, Option<i16>>(idx)
                .ok()
                .flatten()
                .map(|v| JsonValue::Number(v.into())),
            "int4" => pg_row
                .try_get::<_, Option<i32>>(idx)
                .ok()
                .flatten()
                .map(|v| JsonValue::Number(v.into())),
            "int8" => pg_row
                .try_get::<_, Option<i64>>(idx)
                .ok()
                .flatten()
                .map(|v| JsonValue::Number(v.into())),
            "float4" => pg_row
                .try_get::<_, Option<f32>>(idx)
                .ok()
                .flatten()
                .and_then(|v| serde_json::Number::from_f64(v as f64))
                .map(JsonValue::Number),
            "float8" => pg_row
                .try_get::<_, Option<f64>>(idx)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number),
            "bool" => pg_row
                .try_get::<_, Option<bool>>(idx)
                .ok()
                .flatten()
                .map(JsonValue::Bool),
            "json" | "jsonb" => pg_row.try_get::<_, Option<JsonValue>>(idx).ok().flatten(),
            "_text" | "_varchar" => pg_row
                .try_get::<_, Option<Vec<String>>>(idx)
                .ok()
                .flatten()
                .map(|v| JsonValue::Array(v.into_iter().map(JsonValue::String).collect())),
            "timestamptz" => pg_row
                .try_get::<_, Option<DateTime<Utc>>>(idx)
                .ok()
                .flatten()
                .map(|v| JsonValue::String(v.to_rfc3339())),
            "vector" => pg_row
                .try_get::<_, Option<PgVector>>(idx)
                .ok()
                .flatten()
                .and_then(|v| vector_value(v.into_inner())),
            _ => pg_row.try_get::<_, Option<String>>(idx).ok().flatten().map(JsonValue::String),
        };

        data.insert(name, value.unwrap_or(JsonValue::Null));
    }

    Row::new(data)
}

/// JSON array of a vector's elements, or `None` when any element is not
/// finite so that reading the column fails instead of shrinking it.
fn vector_value(values: Vec<f32>) -> Option<JsonValue> {
    values
        .into_iter()
        .map(|x| serde_json::Number::from_f64(x as f64).map(JsonValue::Number))
        .collect::<Option<Vec<_>>>()
        .map(JsonValue::Array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, JsonValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<HashMap<_, _>>()
            .into()
    }

    #[test]
    fn test_row_get_string() {
        let row = row(&[("name", json!("OrderController"))]);
        let name: String = row.get("name").unwrap();
        assert_eq!(name, "OrderController");
    }

    #[test]
    fn test_row_get_vector() {
        let row = row(&[("embedding", json!([0.5, 1.0, -2.0]))]);
        let embedding: Vec<f32> = row.get("embedding").unwrap();
        assert_eq!(embedding, vec![0.5, 1.0, -2.0]);
    }

    #[test]
    fn test_non_finite_vector_element_fails_decode() {
        assert_eq!(vector_value(vec![0.5, -1.0]), Some(json!([0.5, -1.0])));
        assert_eq!(vector_value(vec![0.5, f32::NAN, 1.0]), None);

        let row = row(&[("embedding", JsonValue::Null)]);
        let result: Result<Vec<f32>, _> = row.get("embedding");
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_row_get_missing_key() {
        let row = Row::default();
        let result: Result<String, _> = row.get("missing");
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_row_get_wrong_type() {
        let row = row(&[("count", json!("many"))]);
        let result: Result<i64, _> = row.get("count");
        assert!(result.is_err());
    }

    #[test]
    fn test_row_get_opt_null_and_missing() {
        let row = row(&[("namespace", JsonValue::Null)]);
        let namespace: Option<String> = row.get_opt("namespace").unwrap();
        let other: Option<String> = row.get_opt("other").unwrap();
        assert_eq!(namespace, None);
        assert_eq!(other, None);
    }

    #[test]
    fn test_row_columns() {
        let row = row(&[("a", json!(1)), ("b", json!(2))]);
        let mut columns: Vec<_> = row.columns().collect();
        columns.sort();
        assert_eq!(columns, vec!["a", "b"]);
        assert_eq!(row.len(), 2);
    }
}
