//! Folding generated tables into a persisted document.
//!
//! Regeneration must never lose metadata an operator added by hand, but the
//! table must still follow the current schema shape. [`Document::merge_table`]
//! therefore replaces a table's column list wholesale while copying forward
//! every attribute the generator does not emit itself, both per column and
//! per table.
//!
//! # Example
//!
//! ```
//! use schema_docs_core::*;
//! use serde_json::json;
//!
//! let mut document = Document::new();
//! let mut prior = Table::new("events");
//! prior.columns.push(Column::new("user_id").with_attribute("tests", json!(["not_null"])));
//! prior.columns.push(Column::new("removed_field"));
//! document.tables.push(prior);
//!
//! let generated = GeneratedTable::new("events")
//!     .with_column(GeneratedColumn::new("user_id").with_description("The user"));
//! document.merge_table(generated);
//!
//! let table = document.table("events").unwrap();
//! assert_eq!(table.columns.len(), 1);
//! assert_eq!(table.columns[0].description.as_deref(), Some("The user"));
//! assert_eq!(table.columns[0].extra["tests"], json!(["not_null"]));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::{Column, Document, Table};

/// A column emitted by one generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedColumn {
    /// Normalized column identifier.
    pub name: String,
    /// Generated description; `None` when the schema has no text.
    pub description: Option<String>,
}

impl GeneratedColumn {
    /// Creates a column without a description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Adds a description. Empty text is treated as no description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string()).filter(|text| !text.is_empty());
        self
    }
}

/// A table emitted by one generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTable {
    /// Model identifier.
    pub name: String,
    /// Composite model description.
    pub description: Option<String>,
    /// Columns in generation order.
    pub columns: Vec<GeneratedColumn>,
}

impl GeneratedTable {
    /// Creates a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            columns: Vec::new(),
        }
    }

    /// Sets the model description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string()).filter(|text| !text.is_empty());
        self
    }

    /// Appends a column.
    pub fn with_column(mut self, column: GeneratedColumn) -> Self {
        self.columns.push(column);
        self
    }
}

impl Document {
    /// Folds `generated` into this document.
    ///
    /// - A prior table with the same name is the lookup source for hand edits;
    ///   the result replaces it at the same position. Otherwise the table is
    ///   appended.
    /// - Each generated column inherits every attribute of the same-named prior
    ///   column except `name`, then takes the generated description when one
    ///   was emitted.
    /// - The column list is exactly the generated list: stale columns drop out.
    ///   A repeated column name within one pass keeps its first occurrence.
    /// - Table attributes not emitted by the generator (including a prior
    ///   description when none was generated) are carried forward.
    pub fn merge_table(&mut self, generated: GeneratedTable) {
        let index = self.table_index(&generated.name);
        let file_table = index.map(|index| &self.tables[index]);

        let mut emitted = HashSet::new();
        let mut columns = Vec::with_capacity(generated.columns.len());
        for column in generated.columns {
            if !emitted.insert(column.name.clone()) {
                warn!(
                    table = %generated.name,
                    column = %column.name,
                    "Dropping duplicate generated column"
                );
                continue;
            }
            let prior = file_table.and_then(|table| table.column(&column.name));
            columns.push(merge_column(column, prior));
        }

        let (prior_description, extra) = match file_table {
            Some(table) => (table.description.clone(), table.extra.clone()),
            None => (None, Default::default()),
        };
        let mut merged = Table::new(generated.name);
        merged.description = generated.description.or(prior_description);
        merged.columns = columns;
        merged.extra = extra;

        debug!(
            table = %merged.name,
            columns = merged.columns.len(),
            replaced = index.is_some(),
            "Merged generated table"
        );

        match index {
            Some(index) => self.tables[index] = merged,
            None => self.tables.push(merged),
        }
    }
}

fn merge_column(generated: GeneratedColumn, prior: Option<&Column>) -> Column {
    let mut merged = match prior {
        Some(prior) => Column {
            name: generated.name,
            description: prior.description.clone(),
            extra: prior.extra.clone(),
        },
        None => Column::new(generated.name),
    };
    if let Some(description) = generated.description.filter(|text| !text.is_empty()) {
        merged.description = Some(description);
    }
    merged
}

/// Folds `generated` into `document`, starting a fresh document when there is
/// none yet.
pub fn merge_into(document: Option<Document>, generated: GeneratedTable) -> Document {
    let mut document = document.unwrap_or_default();
    document.merge_table(generated);
    document
}
