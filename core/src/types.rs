//! Column type resolution for leaf fields.
//!
//! JSON-Schema lets a property declare a single `type`, a union of types, or
//! no type at all and an `enum` of allowed literals. Warehouse columns need
//! exactly one type, so every declaration is reduced to one [`FieldType`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocsError, Result};

/// Column type of a resolved leaf field.
///
/// Variants are declared in precedence order, so the derived [`Ord`] picks
/// the widest member of a union: a union that can hold a string must be
/// stored as a string, and an integer/number union as a number.
///
/// # Examples
///
/// ```
/// use schema_docs_core::FieldType;
///
/// assert!(FieldType::String > FieldType::Object);
/// assert!(FieldType::Number > FieldType::Integer);
/// assert_eq!(FieldType::parse("Integer"), Some(FieldType::Integer));
/// assert_eq!(FieldType::parse("date"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Null,
    Boolean,
    Integer,
    Number,
    Array,
    Object,
    String,
}

impl FieldType {
    /// Parses a JSON-Schema type name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Lower-case JSON-Schema name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
            Self::String => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf field produced by walking a schema.
///
/// Created per walk and consumed straight into columns; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    /// Dot-joined path of the field inside the schema.
    pub path: String,
    /// Single column type chosen for the field.
    pub schema_type: FieldType,
    /// The field's own `description`, empty when absent.
    pub description: String,
}

/// Resolves the column type of the property schema `node` found at `path`.
///
/// A `null` result is reported as [`FieldType::Boolean`] since target stores
/// have no null-only column type.
///
/// # Errors
///
/// Returns [`DocsError::Schema`] naming `path` when the node has neither
/// `type` nor `enum`, names an unknown type, or declares an empty union.
///
/// # Examples
///
/// ```
/// use schema_docs_core::{FieldType, resolve_type};
/// use serde_json::json;
///
/// let union = json!({"type": ["integer", "string"]});
/// assert_eq!(resolve_type("a", &union).unwrap(), FieldType::String);
///
/// let numeric_enum = json!({"enum": [1, "2.5"]});
/// assert_eq!(resolve_type("b", &numeric_enum).unwrap(), FieldType::Number);
///
/// assert!(resolve_type("c", &json!({"description": "untyped"})).is_err());
/// ```
pub fn resolve_type(path: &str, node: &Value) -> Result<FieldType> {
    let resolved = match node.get("type").filter(|declared| !declared.is_null()) {
        Some(Value::String(name)) => parse_type_name(path, name)?,
        Some(Value::Array(members)) => widest_member(path, members)?,
        Some(other) => {
            return Err(DocsError::schema(
                path,
                format!("unsupported `type` declaration {other}"),
            ));
        }
        None => match node.get("enum").filter(|options| !options.is_null()) {
            Some(Value::Array(options)) => {
                if options.iter().all(is_numeric_literal) {
                    FieldType::Number
                } else {
                    FieldType::String
                }
            }
            Some(other) => {
                return Err(DocsError::schema(
                    path,
                    format!("`enum` must be a list, found {other}"),
                ));
            }
            None => {
                return Err(DocsError::schema(
                    path,
                    "expected one of `type` or `enum`",
                ));
            }
        },
    };

    if resolved == FieldType::Null {
        Ok(FieldType::Boolean)
    } else {
        Ok(resolved)
    }
}

fn parse_type_name(path: &str, name: &str) -> Result<FieldType> {
    FieldType::parse(name)
        .ok_or_else(|| DocsError::schema(path, format!("unknown type `{name}`")))
}

fn widest_member(path: &str, members: &[Value]) -> Result<FieldType> {
    let mut widest: Option<FieldType> = None;
    for member in members {
        let Some(name) = member.as_str() else {
            return Err(DocsError::schema(
                path,
                format!("union member {member} is not a type name"),
            ));
        };
        let member_type = parse_type_name(path, name)?;
        widest = Some(widest.map_or(member_type, |current| current.max(member_type)));
    }
    widest.ok_or_else(|| DocsError::schema(path, "union type has no members"))
}

/// An enum literal counts as numeric when it is a JSON number or a string
/// that parses as a float.
fn is_numeric_literal(option: &Value) -> bool {
    match option {
        Value::Number(_) => true,
        Value::String(text) => text.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_type_is_lowercased() {
        let node = json!({"type": "STRING"});
        assert_eq!(resolve_type("name", &node).unwrap(), FieldType::String);
    }

    #[test]
    fn test_union_picks_highest_precedence() {
        assert_eq!(
            resolve_type("a", &json!({"type": ["integer", "string"]})).unwrap(),
            FieldType::String
        );
        assert_eq!(
            resolve_type("a", &json!({"type": ["number", "integer", "null"]})).unwrap(),
            FieldType::Number
        );
        assert_eq!(
            resolve_type("a", &json!({"type": ["array", "object"]})).unwrap(),
            FieldType::Object
        );
    }

    #[test]
    fn test_null_remaps_to_boolean() {
        assert_eq!(
            resolve_type("a", &json!({"type": ["null", "boolean"]})).unwrap(),
            FieldType::Boolean
        );
        assert_eq!(
            resolve_type("a", &json!({"type": ["null"]})).unwrap(),
            FieldType::Boolean
        );
        assert_eq!(
            resolve_type("a", &json!({"type": "null"})).unwrap(),
            FieldType::Boolean
        );
    }

    #[test]
    fn test_enum_classification() {
        assert_eq!(
            resolve_type("a", &json!({"enum": [1, 2.5, "3", " 4e2 "]})).unwrap(),
            FieldType::Number
        );
        assert_eq!(
            resolve_type("a", &json!({"enum": [1, "two"]})).unwrap(),
            FieldType::String
        );
        assert_eq!(
            resolve_type("a", &json!({"enum": [true, false]})).unwrap(),
            FieldType::String
        );
        assert_eq!(
            resolve_type("a", &json!({"enum": [null, 1]})).unwrap(),
            FieldType::String
        );
    }

    #[test]
    fn test_type_wins_over_enum() {
        let node = json!({"type": "integer", "enum": ["a", "b"]});
        assert_eq!(resolve_type("a", &node).unwrap(), FieldType::Integer);
    }

    #[test]
    fn test_null_type_falls_back_to_enum() {
        let node = json!({"type": null, "enum": ["a"]});
        assert_eq!(resolve_type("a", &node).unwrap(), FieldType::String);
    }

    #[test]
    fn test_missing_declaration_names_path() {
        let err = resolve_type("user.id", &json!({"description": "no type"})).unwrap_err();
        match err {
            DocsError::Schema { path, .. } => assert_eq!(path, "user.id"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_and_empty_unions_are_errors() {
        assert!(resolve_type("a", &json!({"type": "date"})).is_err());
        assert!(resolve_type("a", &json!({"type": []})).is_err());
        assert!(resolve_type("a", &json!({"type": ["string", 3]})).is_err());
        assert!(resolve_type("a", &json!({"type": {"nested": true}})).is_err());
    }

    #[test]
    fn test_display_matches_schema_name() {
        assert_eq!(FieldType::Integer.to_string(), "integer");
        assert_eq!(
            serde_json::to_string(&FieldType::Object).unwrap(),
            "\"object\""
        );
    }
}
