//! Domain models for the sheetmap ingestion pipeline.
//!
//! - [`CellValue`] - One decoded spreadsheet cell
//! - [`RawRow`] - Ordered column name to cell mapping for one data row
//! - [`Scalar`] - Leaf value of a transformed object
//! - [`Node`] - Nested object tree built per row
//! - [`ColumnMapping`] - Stored column name to target path association
//! - [`MappingRequest`] - Create/update payload for a mapping

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Format used when a date cell is stringified.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =============================================================================
// Cell Values
// =============================================================================

/// A decoded cell as produced by the tabular reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Blank or missing cell.
    Empty,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Canonical string form, used as input of scalar coercion.
    ///
    /// Integral floats print without a fractional part (`42.0` -> `"42"`).
    /// Other floats print their shortest round-trip form, which is not
    /// always the text the spreadsheet displays: a cell computed as
    /// `0.1 + 0.2` gives `"0.30000000000000004"`. `Empty` stringifies to `""`.
    pub fn to_raw_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::DateTime(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Build a text cell, treating an empty string as [`CellValue::Empty`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::DateTime(_) => serializer.serialize_str(&self.to_raw_string()),
        }
    }
}

// =============================================================================
// Raw Rows
// =============================================================================

/// One data row keyed by column name, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell. A repeated column name replaces the earlier value but
    /// keeps its original position.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Output Tree
// =============================================================================

/// Leaf value of a transformed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Integer(i) => Value::from(i),
            Scalar::String(s) => Value::String(s),
        }
    }
}

/// Nested object built from one row.
///
/// Serializes as plain JSON: objects as maps, scalars as their JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Scalar(Scalar),
    Object(BTreeMap<String, Node>),
}

impl Node {
    /// A fresh, empty object.
    pub fn object() -> Self {
        Node::Object(BTreeMap::new())
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Object(map) => Some(map),
            Node::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            Node::Object(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object()?.get(key)
    }

    /// Walk `segments` from this node; `None` as soon as a step is missing.
    pub fn get_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Node> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.get(segment.as_ref()))
    }

    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Scalar(scalar) => scalar.into(),
            Node::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, child)| (key, Value::from(child)))
                    .collect(),
            ),
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

// =============================================================================
// Column Mappings
// =============================================================================

/// A stored association between a spreadsheet column and a target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub id: u64,
    /// Dot-delimited target path, optionally prefixed with `$.`.
    pub json_path: String,
    /// Column name used as the lookup key.
    pub main_column_name: String,
    /// Other header spellings that resolve to the same path.
    #[serde(default, deserialize_with = "deserialize_alternates")]
    pub alternate_column_names: Vec<String>,
}

/// Create / update payload for a [`ColumnMapping`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    #[serde(default)]
    pub json_path: String,
    #[serde(default)]
    pub main_column_name: String,
    #[serde(default, deserialize_with = "deserialize_alternates")]
    pub alternate_column_names: Vec<String>,
}

impl MappingRequest {
    pub fn new(main_column_name: impl Into<String>, json_path: impl Into<String>) -> Self {
        Self {
            json_path: json_path.into(),
            main_column_name: main_column_name.into(),
            alternate_column_names: Vec::new(),
        }
    }

    pub fn with_alternates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_column_names = names.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&ColumnMapping> for MappingRequest {
    fn from(mapping: &ColumnMapping) -> Self {
        Self {
            json_path: mapping.json_path.clone(),
            main_column_name: mapping.main_column_name.clone(),
            alternate_column_names: mapping.alternate_column_names.clone(),
        }
    }
}

/// Alternate names arrive either as a JSON array or as one comma-separated
/// string (the form older clients send).
#[derive(Deserialize)]
#[serde(untagged)]
enum AlternateNames {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_alternates<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match Option::<AlternateNames>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(AlternateNames::List(list)) => list,
        Some(AlternateNames::Joined(joined)) => {
            joined.split(',').map(str::to_string).collect()
        }
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_cell_stringification() {
        assert_eq!(CellValue::Empty.to_raw_string(), "");
        assert_eq!(CellValue::Bool(true).to_raw_string(), "true");
        assert_eq!(CellValue::Number(42.0).to_raw_string(), "42");
        assert_eq!(CellValue::Number(1.5).to_raw_string(), "1.5");
        assert_eq!(CellValue::Number(0.1 + 0.2).to_raw_string(), "0.30000000000000004");
        assert!(CellValue::text("").is_empty());
        assert_eq!(CellValue::Integer(-3).to_raw_string(), "-3");

        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(dt).to_raw_string(), "2024-01-02T10:30:00");
    }

    #[test]
    fn test_raw_row_keeps_order_and_replaces_duplicates() {
        let mut row = RawRow::new();
        row.insert("B", CellValue::text("1"));
        row.insert("A", CellValue::text("2"));
        row.insert("B", CellValue::text("3"));

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["B", "A"]);
        assert_eq!(row.get("B"), Some(&CellValue::Text("3".into())));
        assert_eq!(serde_json::to_value(&row).unwrap(), json!({"B": "3", "A": "2"}));
    }

    #[test]
    fn test_node_serializes_as_plain_json() {
        let mut user = BTreeMap::new();
        user.insert("id".to_string(), Node::Scalar(Scalar::Integer(42)));
        user.insert("active".to_string(), Node::Scalar(Scalar::Bool(true)));
        let mut root = BTreeMap::new();
        root.insert("user".to_string(), Node::Object(user));
        let node = Node::Object(root);

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value, json!({"user": {"id": 42, "active": true}}));
        assert_eq!(node.to_value(), value);
        assert_eq!(
            node.get_path(&["user", "id"]),
            Some(&Node::Scalar(Scalar::Integer(42)))
        );
        assert!(node.get_path(&["user", "missing"]).is_none());
    }

    #[test]
    fn test_alternates_accept_string_or_array() {
        let from_string: MappingRequest = serde_json::from_value(json!({
            "jsonPath": "$.user.id",
            "mainColumnName": "USER_ID",
            "alternateColumnNames": "UID, user id ,"
        }))
        .unwrap();
        assert_eq!(from_string.alternate_column_names, vec!["UID", "user id"]);

        let from_array: MappingRequest = serde_json::from_value(json!({
            "jsonPath": "$.user.id",
            "mainColumnName": "USER_ID",
            "alternateColumnNames": ["UID"]
        }))
        .unwrap();
        assert_eq!(from_array.alternate_column_names, vec!["UID"]);

        let missing: MappingRequest = serde_json::from_value(json!({
            "jsonPath": "$.user.id",
            "mainColumnName": "USER_ID",
            "alternateColumnNames": null
        }))
        .unwrap();
        assert!(missing.alternate_column_names.is_empty());
    }
}
