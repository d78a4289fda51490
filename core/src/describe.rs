//! Human-authored descriptions for schemas and their fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ResolvedField;

/// Sentence that opens every composite model description.
pub const COMPOSITE_DESCRIPTION_PREFIX: &str =
    "Normalized event model from schemas with the following descriptions: ";

/// Descriptions pulled from one schema: the schema's own text plus one entry
/// per resolved leaf field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocs {
    /// Schema-level `description`, if any.
    pub description: Option<String>,
    /// Field descriptions, empty strings where a field has none.
    pub fields: Vec<String>,
}

impl SchemaDocs {
    /// Collects the schema description and the descriptions of `fields`.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_docs_core::{SchemaDocs, resolve_fields};
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "description": "Link click",
    ///     "properties": {
    ///         "targetUrl": {"type": "string", "description": "Where the link points"},
    ///         "elementId": {"type": "string"}
    ///     }
    /// });
    /// let fields = resolve_fields(&schema, true, &[]).unwrap();
    /// let docs = SchemaDocs::extract(&schema, &fields);
    ///
    /// assert_eq!(docs.description.as_deref(), Some("Link click"));
    /// assert_eq!(docs.fields, ["", "Where the link points"]);
    /// ```
    pub fn extract(schema: &Value, fields: &[ResolvedField]) -> Self {
        Self {
            description: schema_description(schema).map(str::to_string),
            fields: fields.iter().map(|field| field.description.clone()).collect(),
        }
    }
}

/// Returns the schema-level `description`, ignoring blank text.
pub fn schema_description(schema: &Value) -> Option<&str> {
    schema
        .get("description")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

/// Returns a property's own `description`, or an empty string.
pub fn field_description(node: &Value) -> String {
    node.get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Builds the description of a model fed by one or more schemas.
///
/// Schema descriptions are joined with newlines behind
/// [`COMPOSITE_DESCRIPTION_PREFIX`]. Returns `None` when no schema
/// contributed a description.
///
/// # Examples
///
/// ```
/// use schema_docs_core::{COMPOSITE_DESCRIPTION_PREFIX, composite_description};
///
/// let description = composite_description(["A", "B"]).unwrap();
/// assert_eq!(description, format!("{COMPOSITE_DESCRIPTION_PREFIX}A\nB"));
/// assert!(composite_description(Vec::<&str>::new()).is_none());
/// ```
pub fn composite_description<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let joined: Vec<&str> = descriptions.into_iter().collect();
    if joined.is_empty() {
        return None;
    }
    Some(format!("{COMPOSITE_DESCRIPTION_PREFIX}{}", joined.join("\n")))
}
