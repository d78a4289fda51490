//! Schema flattening and documentation merge engine.
//!
//! This crate turns nested event JSON Schemas into flat column lists and folds
//! them into a persisted documentation document:
//!
//! - [`resolve_fields`] / [`resolve_paths`] reduce a schema to its leaf field
//!   paths, collapsing arrays into a single column.
//! - [`resolve_type`] picks the widest declared type of a field.
//! - [`normalize_case`] derives snake_case column identifiers.
//! - [`SchemaDocs`] and [`composite_description`] gather human descriptions.
//! - [`Filter`] compiles the JSONPath-style exclusion expressions.
//! - [`ModelInput`] assembles one [`GeneratedTable`] from a model's schemas.
//! - [`Document::merge_table`] folds a generated table into a [`Document`]
//!   while keeping hand-edited attributes.
//!
//! The crate does no file I/O. Schemas are `serde_json::Value`s and documents
//! are plain data that callers persist however they like.
//!
//! # Example
//!
//! ```
//! use schema_docs_core::*;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "self": {"vendor": "com.acme", "name": "checkout", "format": "jsonschema", "version": "2-0-0"},
//!     "description": "Checkout completed",
//!     "properties": {
//!         "orderId": {"type": "string", "description": "Order identifier"},
//!         "basket": {
//!             "type": "object",
//!             "properties": {"totalValue": {"type": ["null", "number"]}}
//!         }
//!     }
//! });
//!
//! let model = ModelInput::new("snowplow_checkout_2", vec!["checkout".into()])
//!     .with_events(SchemaGroup::new(vec![schema]));
//! let document = apply_models(None, &[model]).unwrap().unwrap();
//!
//! let table = document.table("snowplow_checkout_2").unwrap();
//! let columns: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(
//!     columns,
//!     ["event_id", "collector_tstamp", "basket.total_value", "order_id"]
//! );
//! assert_eq!(table.columns[3].description.as_deref(), Some("Order identifier"));
//! ```

mod case;
mod describe;
mod document;
mod error;
mod filter;
mod merge;
mod model;
mod paths;
mod types;

pub use case::normalize_case;
pub use describe::{
    COMPOSITE_DESCRIPTION_PREFIX, SchemaDocs, composite_description, field_description,
    schema_description,
};
pub use document::{Column, DOCUMENT_VERSION, Document, Table};
pub use error::{DocsError, Result};
pub use filter::{Filter, excluded_paths};
pub use merge::{GeneratedColumn, GeneratedTable, merge_into};
pub use model::{BASE_COLUMNS, ModelInput, ModelRun, SchemaGroup, apply_models, run_models};
pub use paths::{resolve_fields, resolve_paths};
pub use types::{FieldType, ResolvedField, resolve_type};
