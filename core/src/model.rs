//! Assembly of one generated table from the schemas that feed a model.
//!
//! A model combines one or more self-describing event schemas with optional
//! context schemas. Every resolved leaf of every schema becomes a column,
//! behind a fixed set of base event columns. Column names are disambiguated
//! with event-name and alias prefixes before case normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::case::normalize_case;
use crate::describe::{SchemaDocs, composite_description};
use crate::document::Document;
use crate::error::{DocsError, Result};
use crate::filter::Filter;
use crate::merge::{GeneratedColumn, GeneratedTable, merge_into};
use crate::paths::resolve_fields;

/// Columns every event model starts with.
pub const BASE_COLUMNS: &[&str] = &["event_id", "collector_tstamp"];

/// A group of schemas that share an alias list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaGroup {
    /// Parsed schema documents, in configuration order.
    pub schemas: Vec<Value>,
    /// Column prefixes, one per schema. Empty means none were configured.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SchemaGroup {
    /// Creates a group without aliases.
    pub fn new(schemas: Vec<Value>) -> Self {
        Self {
            schemas,
            aliases: Vec::new(),
        }
    }

    /// Sets the alias list.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Returns one alias per schema, or `None` when columns are not prefixed.
    ///
    /// Configured aliases must match the schema count. Without configured
    /// aliases a group of several schemas is prefixed with each schema's
    /// `self.name`.
    fn effective_aliases(&self, model: &str) -> Result<Option<Vec<String>>> {
        if !self.aliases.is_empty() {
            if self.aliases.len() != self.schemas.len() {
                return Err(DocsError::Model(format!(
                    "model `{model}` has {} aliases for {} schemas",
                    self.aliases.len(),
                    self.schemas.len()
                )));
            }
            return Ok(Some(self.aliases.clone()));
        }
        if self.schemas.len() <= 1 {
            return Ok(None);
        }
        self.schemas
            .iter()
            .enumerate()
            .map(|(index, schema)| {
                schema_name(schema).map(str::to_string).ok_or_else(|| {
                    DocsError::Model(format!(
                        "model `{model}`: schema {index} has no `self.name` to use as alias"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

/// Everything needed to generate the table of one model.
///
/// # Examples
///
/// ```
/// use schema_docs_core::{ModelInput, SchemaGroup};
/// use serde_json::json;
///
/// let schema = json!({
///     "self": {"vendor": "com.acme", "name": "link_click", "format": "jsonschema", "version": "1-0-0"},
///     "description": "Link click",
///     "properties": {"targetUrl": {"type": "string", "description": "Target"}}
/// });
///
/// let model = ModelInput::new("snowplow_link_click_1", vec!["link_click".into()])
///     .with_events(SchemaGroup::new(vec![schema]));
/// let table = model.generate().unwrap().unwrap();
///
/// let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
/// assert_eq!(names, ["event_id", "collector_tstamp", "target_url"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Name of the generated table.
    pub name: String,
    /// Event names the model covers.
    pub event_names: Vec<String>,
    /// Atomic event columns emitted after the base columns.
    #[serde(default)]
    pub event_columns: Vec<String>,
    /// Self-describing event schemas.
    #[serde(default)]
    pub events: SchemaGroup,
    /// Context (entity) schemas.
    #[serde(default)]
    pub contexts: SchemaGroup,
    /// Whether nested objects are walked.
    pub deep: bool,
    /// Exclusion filter expressions applied to every schema.
    #[serde(default)]
    pub filters: Vec<String>,
}

impl ModelInput {
    /// Creates a deep-walking model with no schemas.
    pub fn new(name: impl Into<String>, event_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            event_names,
            event_columns: Vec::new(),
            events: SchemaGroup::default(),
            contexts: SchemaGroup::default(),
            deep: true,
            filters: Vec::new(),
        }
    }

    /// Sets the self-describing event schemas.
    pub fn with_events(mut self, events: SchemaGroup) -> Self {
        self.events = events;
        self
    }

    /// Sets the context schemas.
    pub fn with_contexts(mut self, contexts: SchemaGroup) -> Self {
        self.contexts = contexts;
        self
    }

    /// Sets the flat event columns.
    pub fn with_event_columns(mut self, columns: Vec<String>) -> Self {
        self.event_columns = columns;
        self
    }

    /// Sets the exclusion filters.
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Sets whether nested objects are walked.
    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Generates the table for this model.
    ///
    /// Returns `Ok(None)` when the model has no schemas at all.
    ///
    /// # Errors
    ///
    /// - [`DocsError::Filter`] for a malformed filter, before any schema is
    ///   walked.
    /// - [`DocsError::Model`] for alias or event-name lists that do not line
    ///   up with the schemas.
    /// - [`DocsError::Schema`] for an unresolvable field.
    pub fn generate(&self) -> Result<Option<GeneratedTable>> {
        let filters = Filter::compile_all(&self.filters)?;
        if self.events.schemas.is_empty() && self.contexts.schemas.is_empty() {
            debug!(model = %self.name, "Model has no schemas, skipping");
            return Ok(None);
        }

        let event_aliases = self.events.effective_aliases(&self.name)?;
        let context_aliases = self.contexts.effective_aliases(&self.name)?;
        let event_prefixes = self.event_prefixes()?;

        let mut table = GeneratedTable::new(&self.name);
        for name in BASE_COLUMNS
            .iter()
            .copied()
            .chain(self.event_columns.iter().map(String::as_str))
        {
            table.columns.push(GeneratedColumn::new(name));
        }

        let mut descriptions = Vec::new();
        for (index, schema) in self.events.schemas.iter().enumerate() {
            let prefixes = [
                alias_at(&event_aliases, index),
                event_prefixes.map(|names| names[index].as_str()),
            ];
            descriptions.extend(self.push_schema(&mut table, schema, &prefixes, &filters)?);
        }
        for (index, schema) in self.contexts.schemas.iter().enumerate() {
            let prefixes = [alias_at(&context_aliases, index), None];
            descriptions.extend(self.push_schema(&mut table, schema, &prefixes, &filters)?);
        }

        table.description = composite_description(descriptions.iter().map(String::as_str));
        debug!(
            model = %self.name,
            columns = table.columns.len(),
            "Generated model table"
        );
        Ok(Some(table))
    }

    /// Event names used as column prefixes, present only with several names.
    fn event_prefixes(&self) -> Result<Option<&[String]>> {
        if self.event_names.len() <= 1 {
            return Ok(None);
        }
        if self.event_names.len() < self.events.schemas.len() {
            return Err(DocsError::Model(format!(
                "model `{}` has {} event names for {} event schemas",
                self.name,
                self.event_names.len(),
                self.events.schemas.len()
            )));
        }
        Ok(Some(&self.event_names))
    }

    /// Appends the columns of one schema and returns its description.
    fn push_schema(
        &self,
        table: &mut GeneratedTable,
        schema: &Value,
        prefixes: &[Option<&str>],
        filters: &[Filter],
    ) -> Result<Option<String>> {
        let fields = resolve_fields(schema, self.deep, filters)?;
        let docs = SchemaDocs::extract(schema, &fields);
        for (field, description) in fields.iter().zip(&docs.fields) {
            let name = prefixes
                .iter()
                .flatten()
                .copied()
                .chain([field.path.as_str()])
                .collect::<Vec<_>>()
                .join("_");
            table
                .columns
                .push(GeneratedColumn::new(normalize_case(&name)).with_description(description));
        }
        Ok(docs.description)
    }
}

fn alias_at(aliases: &Option<Vec<String>>, index: usize) -> Option<&str> {
    aliases.as_ref().map(|aliases| aliases[index].as_str())
}

fn schema_name(schema: &Value) -> Option<&str> {
    schema.pointer("/self/name").and_then(Value::as_str)
}

/// Outcome of generating a list of models into one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    /// The merged document, or the input document when nothing was generated.
    pub document: Option<Document>,
    /// Names of the models that produced a table, in merge order.
    pub documented: Vec<String>,
}

/// Generates every model and merges them, in order, into one document,
/// recording which models produced a table.
///
/// # Errors
///
/// Stops at the first model that fails to generate; see
/// [`ModelInput::generate`].
pub fn run_models(document: Option<Document>, models: &[ModelInput]) -> Result<ModelRun> {
    let mut run = ModelRun {
        document,
        documented: Vec::new(),
    };
    for model in models {
        let Some(table) = model.generate()? else {
            debug!(model = %model.name, "Model produced no table");
            continue;
        };
        run.documented.push(table.name.clone());
        run.document = Some(merge_into(run.document.take(), table));
    }
    Ok(run)
}

/// Generates every model and merges them, in order, into one document.
///
/// Returns the input document unchanged when no model produced a table.
///
/// # Errors
///
/// Stops at the first model that fails to generate; see
/// [`ModelInput::generate`].
pub fn apply_models(document: Option<Document>, models: &[ModelInput]) -> Result<Option<Document>> {
    Ok(run_models(document, models)?.document)
}
