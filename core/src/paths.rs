//! Leaf path resolution for nested schemas.
//!
//! Walks the `properties` tree of a schema and reduces it to the minimal set
//! of leaf field paths that become columns. Container objects disappear in
//! favour of their terminal fields, while arrays collapse into a single column
//! for the whole array value.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::describe::field_description;
use crate::error::Result;
use crate::filter::{Filter, excluded_paths};
use crate::types::{ResolvedField, resolve_type};

/// A property found during the walk, with the schema node that declares it.
#[derive(Debug, Clone)]
struct Candidate<'s> {
    path: String,
    node: &'s Value,
}

/// Resolves the leaf fields of `schema` and annotates each with its type and
/// description.
///
/// With `deep` set, nested objects (including objects inside array items) are
/// walked; otherwise only top-level properties are considered. Paths matched
/// by any of `filters` are dropped after leaf resolution. The result is sorted
/// by path.
///
/// # Errors
///
/// Returns [`DocsError::Schema`](crate::DocsError::Schema) for the first leaf
/// whose type cannot be resolved.
///
/// # Examples
///
/// ```
/// use schema_docs_core::{FieldType, resolve_fields};
/// use serde_json::json;
///
/// let schema = json!({
///     "properties": {
///         "tags": {
///             "type": "array",
///             "items": {"type": "object", "properties": {"b": {"type": "string"}}}
///         },
///         "user": {
///             "type": "object",
///             "properties": {"id": {"type": ["null", "integer"]}}
///         }
///     }
/// });
///
/// let fields = resolve_fields(&schema, true, &[]).unwrap();
/// let paths: Vec<_> = fields.iter().map(|f| f.path.as_str()).collect();
/// assert_eq!(paths, ["tags", "user.id"]);
/// assert_eq!(fields[0].schema_type, FieldType::Array);
/// assert_eq!(fields[1].schema_type, FieldType::Integer);
/// ```
pub fn resolve_fields(schema: &Value, deep: bool, filters: &[Filter]) -> Result<Vec<ResolvedField>> {
    let excluded = excluded_paths(filters, schema);
    leaf_candidates(schema, deep, &excluded)
        .into_iter()
        .map(|candidate| {
            Ok(ResolvedField {
                schema_type: resolve_type(&candidate.path, candidate.node)?,
                description: field_description(candidate.node),
                path: candidate.path,
            })
        })
        .collect()
}

/// Returns the sorted leaf paths of `schema`, without annotating them.
///
/// Paths contained in `excluded` are removed after leaf resolution.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
///
/// use schema_docs_core::resolve_paths;
/// use serde_json::json;
///
/// let schema = json!({
///     "properties": {
///         "a": {"type": "object", "properties": {"b": {"type": "string"}}},
///         "c": {"type": "string"}
///     }
/// });
///
/// assert_eq!(resolve_paths(&schema, true, &BTreeSet::new()), ["a.b", "c"]);
/// assert_eq!(resolve_paths(&schema, false, &BTreeSet::new()), ["a", "c"]);
/// ```
pub fn resolve_paths(schema: &Value, deep: bool, excluded: &BTreeSet<String>) -> Vec<String> {
    leaf_candidates(schema, deep, excluded)
        .into_iter()
        .map(|candidate| candidate.path)
        .collect()
}

fn leaf_candidates<'s>(
    schema: &'s Value,
    deep: bool,
    excluded: &BTreeSet<String>,
) -> Vec<Candidate<'s>> {
    let mut candidates = Vec::new();
    let mut array_boundaries = Vec::new();
    enumerate(schema, None, deep, &mut candidates, &mut array_boundaries);

    let enumerated = candidates.len();
    candidates.retain(|candidate| {
        !array_boundaries
            .iter()
            .any(|boundary| extends(&candidate.path, boundary))
    });
    let mut leaves = retain_leaves(candidates);
    leaves.retain(|candidate| !excluded.contains(&candidate.path));
    leaves.sort_by(|a, b| a.path.cmp(&b.path));

    debug!(
        enumerated,
        leaves = leaves.len(),
        array_boundaries = array_boundaries.len(),
        excluded = excluded.len(),
        "Resolved schema leaf paths"
    );

    leaves
}

fn enumerate<'s>(
    node: &'s Value,
    prefix: Option<&str>,
    deep: bool,
    out: &mut Vec<Candidate<'s>>,
    array_boundaries: &mut Vec<String>,
) {
    let Some(properties) = node.get("properties").and_then(Value::as_object) else {
        return;
    };

    for (name, child) in properties {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.clone(),
        };
        out.push(Candidate {
            path: path.clone(),
            node: child,
        });

        if !deep {
            continue;
        }

        if declares_array(child) {
            array_boundaries.push(path.clone());
        }
        enumerate(child, Some(&path), deep, out, array_boundaries);
        if let Some(items) = child.get("items") {
            let items_path = format!("{path}.items");
            enumerate(items, Some(&items_path), deep, out, array_boundaries);
        }
    }
}

/// Keeps only candidates that no other candidate extends.
///
/// Candidates are checked shortest first, so a container path is dropped as
/// soon as any longer path sits beneath it. Duplicate paths keep their first
/// occurrence.
fn retain_leaves(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by_key(|candidate| candidate.path.len());

    let mut seen = BTreeSet::new();
    let mut leaves = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let has_descendant = candidates[index + 1..]
            .iter()
            .any(|other| extends(&other.path, &candidate.path));
        if has_descendant || !seen.insert(candidate.path.clone()) {
            continue;
        }
        leaves.push(candidate.clone());
    }
    leaves
}

/// Returns `true` when `path` lies strictly beneath `ancestor`.
fn extends(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

fn declares_array(node: &Value) -> bool {
    match node.get("type") {
        Some(Value::String(name)) => name.eq_ignore_ascii_case("array"),
        Some(Value::Array(members)) => members
            .iter()
            .filter_map(Value::as_str)
            .any(|name| name.eq_ignore_ascii_case("array")),
        _ => false,
    }
}
