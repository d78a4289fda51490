//! Generator configuration.
//!
//! Describes which models to generate and which schema files feed each of
//! them. Files ending in `.json` are read as JSON, everything else as YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! models_prefix: snowplow
//! deep: true
//! models:
//!   - event_names: [link_click]
//!     event_columns: [page_url]
//!     self_describing_event_schemas:
//!       - schemas/link_click-1-0-1.json
//!     context_schemas:
//!       - schemas/web_page-1-0-0.json
//!     context_aliases: [page]
//!     filters:
//!       - "$.properties.elementClasses"
//! ```
//!
//! Relative schema paths are resolved against the directory holding the
//! config file.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use schema_docs_core::{ModelInput, SchemaGroup};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::SchemaCache;
use crate::error::{Result, StoreError};

// SAFETY: This regex is a compile-time constant and is validated by tests.
static SCHEMA_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)-\d+-\d+$").expect("static regex must compile")
});

const DEFAULT_MAJOR_VERSION: &str = "1";

fn default_prefix() -> String {
    "snowplow".to_string()
}

fn default_deep() -> bool {
    true
}

/// Top-level generator configuration.
///
/// # Examples
///
/// ```
/// use schema_docs_store::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_yaml::from_str("models: []").unwrap();
/// assert_eq!(config.models_prefix, "snowplow");
/// assert!(config.deep);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Prefix for model names without a custom `table_name`. Empty for none.
    #[serde(default = "default_prefix")]
    pub models_prefix: String,
    /// Whether nested objects are walked unless a model says otherwise.
    #[serde(default = "default_deep")]
    pub deep: bool,
    /// Models to generate, in order.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

/// One model entry of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Event names the model covers; the first one names the model.
    pub event_names: Vec<String>,
    /// Custom model name, required when several event names are given.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Major version used in the model name when a single event schema does
    /// not carry one.
    #[serde(default, deserialize_with = "version_text")]
    pub version: Option<String>,
    /// Atomic event columns to document.
    #[serde(default)]
    pub event_columns: Vec<String>,
    /// Self-describing event schema files.
    #[serde(default)]
    pub self_describing_event_schemas: Vec<PathBuf>,
    /// Column prefixes for the self-describing event schemas.
    #[serde(default)]
    pub self_describing_event_aliases: Vec<String>,
    /// Context schema files.
    #[serde(default)]
    pub context_schemas: Vec<PathBuf>,
    /// Column prefixes for the context schemas.
    #[serde(default)]
    pub context_aliases: Vec<String>,
    /// Exclusion filter expressions.
    #[serde(default)]
    pub filters: Vec<String>,
    /// Per-model override of [`GeneratorConfig::deep`].
    #[serde(default)]
    pub deep: Option<bool>,
}

/// Accepts `version: 2` as well as `version: "2"`.
fn version_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Version>::deserialize(deserializer)?.map(|version| match version {
        Version::Number(number) => number.to_string(),
        Version::Text(text) => text,
    }))
}

impl GeneratorConfig {
    /// Loads configuration from a YAML or JSON file and validates it.
    ///
    /// Relative schema paths are made relative to the config file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the file cannot be read,
    /// [`StoreError::YamlError`] / [`StoreError::JsonError`] if parsing fails,
    /// and [`StoreError::InvalidConfig`] if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };

        if let Some(base) = path.parent() {
            config.anchor_schema_paths(base);
        }
        config.validate()?;
        debug!(path = %path.display(), models = config.models.len(), "Loaded config");
        Ok(config)
    }

    /// Checks the structural rules not expressed by the types.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for a model without event names
    /// or a model with several event names but no `table_name`.
    pub fn validate(&self) -> Result<()> {
        for (index, model) in self.models.iter().enumerate() {
            if model.event_names.is_empty() {
                return Err(StoreError::InvalidConfig(format!(
                    "model {index} has no event_names"
                )));
            }
            if model.event_names.len() > 1 && model.table_name.is_none() {
                return Err(StoreError::InvalidConfig(format!(
                    "model {index} has several event_names and needs a table_name"
                )));
            }
        }
        Ok(())
    }

    fn anchor_schema_paths(&mut self, base: &Path) {
        for model in &mut self.models {
            for path in model
                .self_describing_event_schemas
                .iter_mut()
                .chain(model.context_schemas.iter_mut())
            {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// Returns the name of every configured model, in order.
    ///
    /// # Errors
    ///
    /// Fails when a schema has to be read to find its version and cannot be.
    pub fn model_names(&self, cache: &mut SchemaCache) -> Result<Vec<String>> {
        self.models
            .iter()
            .map(|model| model.model_name(&self.models_prefix, cache))
            .collect()
    }

    /// Loads every model's schemas and builds the engine inputs.
    ///
    /// # Errors
    ///
    /// Fails on the first schema that cannot be read or parsed.
    pub fn model_inputs(&self, cache: &mut SchemaCache) -> Result<Vec<ModelInput>> {
        self.models
            .iter()
            .map(|model| {
                let events = load_group(
                    cache,
                    &model.self_describing_event_schemas,
                    &model.self_describing_event_aliases,
                )?;
                let contexts = load_group(cache, &model.context_schemas, &model.context_aliases)?;
                Ok(ModelInput::new(
                    model.model_name(&self.models_prefix, cache)?,
                    model.event_names.clone(),
                )
                .with_event_columns(model.event_columns.clone())
                .with_events(events)
                .with_contexts(contexts)
                .with_filters(model.filters.clone())
                .with_deep(model.deep.unwrap_or(self.deep)))
            })
            .collect()
    }
}

fn load_group(cache: &mut SchemaCache, paths: &[PathBuf], aliases: &[String]) -> Result<SchemaGroup> {
    let schemas = paths
        .iter()
        .map(|path| cache.load(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(SchemaGroup::new(schemas).with_aliases(aliases.to_vec()))
}

impl ModelConfig {
    /// Builds the model name: `<table_name or first event name>_<major>`,
    /// behind `<prefix>_` when there is no custom table name.
    ///
    /// # Errors
    ///
    /// Fails when the schema has to be read to find its version and cannot be.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_docs_store::{ModelConfig, SchemaCache};
    ///
    /// let model = ModelConfig {
    ///     event_names: vec!["link_click".into()],
    ///     self_describing_event_schemas: vec!["schemas/link_click-2-0-1.json".into()],
    ///     ..ModelConfig::default()
    /// };
    /// let mut cache = SchemaCache::new();
    /// assert_eq!(model.model_name("snowplow", &mut cache).unwrap(), "snowplow_link_click_2");
    /// assert_eq!(model.model_name("", &mut cache).unwrap(), "link_click_2");
    /// ```
    pub fn model_name(&self, prefix: &str, cache: &mut SchemaCache) -> Result<String> {
        let major = self.major_version(cache)?;
        Ok(match &self.table_name {
            Some(table_name) => format!("{table_name}_{major}"),
            None => {
                let event_name = self.event_names.first().map(String::as_str).unwrap_or_default();
                if prefix.is_empty() {
                    format!("{event_name}_{major}")
                } else {
                    format!("{prefix}_{event_name}_{major}")
                }
            }
        })
    }

    /// Major version for the model name.
    ///
    /// A single self-describing schema decides it, through its file name
    /// (`…-2-0-1.json`) or else its `self.version`. An explicit `version` is
    /// used when there is no such schema or the schema carries no version.
    /// Anything else falls back to `1`.
    fn major_version(&self, cache: &mut SchemaCache) -> Result<String> {
        if let [schema] = self.self_describing_event_schemas.as_slice() {
            let from_name = schema
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(major_of);
            if let Some(major) = from_name {
                return Ok(major.to_string());
            }
            let document = cache.load(schema)?;
            let from_self = document
                .pointer("/self/version")
                .and_then(Value::as_str)
                .and_then(major_of);
            if let Some(major) = from_self {
                return Ok(major.to_string());
            }
        }
        Ok(match &self.version {
            Some(version) => major_of(version).unwrap_or(version).to_string(),
            None => DEFAULT_MAJOR_VERSION.to_string(),
        })
    }
}

/// Extracts `2` from `2-0-1` or `link_click-2-0-1`.
fn major_of(version: &str) -> Option<&str> {
    SCHEMA_VERSION
        .captures(version)
        .and_then(|captures| captures.get(1))
        .map(|major| major.as_str())
}
