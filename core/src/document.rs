//! Persisted documentation document model.
//!
//! A [`Document`] holds one [`Table`] entry per generated model, each with its
//! ordered [`Column`] list. Keys the generator does not know about are kept in
//! an `extra` side-map on every record so hand-added metadata (tests, tags,
//! config blocks) survives regeneration untouched.
//!
//! Serialization applies the presentation rules of the artifact: a fixed
//! priority prefix of keys, then every remaining key in lexicographic order,
//! with empty or falsy values dropped. A table read from an existing document
//! and left unchanged is written back exactly as it was authored.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{DocsError, Result};

/// Format version written into freshly created documents.
pub const DOCUMENT_VERSION: i64 = 2;

const COLUMN_KEYS: &[&str] = &["name", "description"];
const TABLE_KEYS: &[&str] = &["name", "description", "columns"];
const DOCUMENT_KEYS: &[&str] = &["version", "description", "models", "tables"];

/// One column of a documented table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Column {
    /// Normalized column identifier; the column's identity within a table.
    pub name: String,
    /// Column description.
    #[serde(default)]
    pub description: Option<String>,
    /// Every other attribute, carried forward verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Column {
    /// Creates a column with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds an extra attribute.
    pub fn with_attribute(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

/// A documented model.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Model identifier; at most one table per name in a document.
    pub name: String,
    /// Model description.
    pub description: Option<String>,
    /// Columns in generation order.
    pub columns: Vec<Column>,
    /// Every other table attribute, carried forward verbatim.
    pub extra: BTreeMap<String, Value>,
    /// The entry as read, together with its parsed form at read time.
    authored: Option<Box<(Map<String, Value>, Table)>>,
}

#[derive(Deserialize)]
struct TableFields {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<TableFields> for Table {
    fn from(fields: TableFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            columns: fields.columns,
            extra: fields.extra,
            authored: None,
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.columns == other.columns
            && self.extra == other.extra
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = Map::<String, Value>::deserialize(deserializer)?;
        let fields: TableFields =
            serde_json::from_value(Value::Object(source.clone())).map_err(D::Error::custom)?;
        let snapshot = Table::from(fields);
        Ok(Self {
            authored: Some(Box::new((source, snapshot.clone()))),
            ..snapshot
        })
    }
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Looks up the first column named `name`.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// The authored entry, if this table was read and has not changed since.
    fn unchanged_source(&self) -> Option<&Map<String, Value>> {
        let (source, snapshot) = self.authored.as_deref()?;
        (self == snapshot).then_some(source)
    }
}

/// The whole documentation artifact.
///
/// # Examples
///
/// ```
/// use schema_docs_core::{Column, Document, Table};
///
/// let mut table = Table::new("t");
/// table.description = Some("d".into());
/// table.columns.push(Column::new("a"));
/// table.extra.insert("zzz".into(), "v".into());
///
/// let mut document = Document::new();
/// document.tables.push(table);
///
/// let rendered = serde_json::to_string(&document).unwrap();
/// assert_eq!(
///     rendered,
///     r#"{"version":2,"models":[{"name":"t","description":"d","columns":[{"name":"a"}],"zzz":"v"}]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    /// Artifact format version.
    #[serde(default = "default_version")]
    pub version: i64,
    /// Document-level description.
    #[serde(default)]
    pub description: Option<String>,
    /// One entry per model, stored under the `models` key. A `tables` key is
    /// also accepted on read.
    #[serde(default, rename = "models", alias = "tables")]
    pub tables: Vec<Table>,
    /// Every other top-level key, carried forward verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_version() -> i64 {
    DOCUMENT_VERSION
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates the document used on the first run: `{version: 2, models: []}`.
    pub fn new() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            description: None,
            tables: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Interprets an already-parsed value as a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Merge`] when the value does not have the document
    /// structure (e.g., a table without a name, or a non-list `models`).
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| DocsError::Merge(err.to_string()))
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Position of the table named `name`.
    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|table| table.name == name)
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.name.is_empty() {
            map.serialize_entry("name", &self.name)?;
        }
        if let Some(description) = present_text(&self.description) {
            map.serialize_entry("description", description)?;
        }
        serialize_extra(&mut map, &self.extra, COLUMN_KEYS)?;
        map.end()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if let Some(source) = self.unchanged_source() {
            return source.serialize(serializer);
        }
        let mut map = serializer.serialize_map(None)?;
        if !self.name.is_empty() {
            map.serialize_entry("name", &self.name)?;
        }
        if let Some(description) = present_text(&self.description) {
            map.serialize_entry("description", description)?;
        }
        if !self.columns.is_empty() {
            map.serialize_entry("columns", &self.columns)?;
        }
        serialize_extra(&mut map, &self.extra, TABLE_KEYS)?;
        map.end()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.version != 0 {
            map.serialize_entry("version", &self.version)?;
        }
        if let Some(description) = present_text(&self.description) {
            map.serialize_entry("description", description)?;
        }
        if !self.tables.is_empty() {
            map.serialize_entry("models", &self.tables)?;
        }
        serialize_extra(&mut map, &self.extra, DOCUMENT_KEYS)?;
        map.end()
    }
}

fn present_text(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|text| !text.is_empty())
}

/// Writes the non-priority keys in lexicographic order, skipping falsy ones.
fn serialize_extra<M: SerializeMap>(
    map: &mut M,
    extra: &BTreeMap<String, Value>,
    reserved: &[&str],
) -> std::result::Result<(), M::Error> {
    for (key, value) in extra {
        if reserved.contains(&key.as_str()) || is_falsy(value) {
            continue;
        }
        map.serialize_entry(key, value)?;
    }
    Ok(())
}

/// Empty or zero-like values are not written to the artifact.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
