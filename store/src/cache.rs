//! Explicit cache of schema file contents.
//!
//! Several models commonly share context schemas, so each file is read from
//! disk once per [`SchemaCache`]. The cache is an ordinary value owned by the
//! caller; dropping it releases everything.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Raw schema text keyed by canonical file path.
///
/// # Examples
///
/// ```no_run
/// use schema_docs_store::SchemaCache;
///
/// let mut cache = SchemaCache::new();
/// let schema = cache.load("schemas/link_click-1-0-0.json").unwrap();
/// let again = cache.load("schemas/./link_click-1-0-0.json").unwrap();
/// assert_eq!(schema, again);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<PathBuf, String>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and parses the schema at `path`, reading the file only on the
    /// first request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the file cannot be read and
    /// [`StoreError::InvalidSchema`] if it is not valid JSON.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let key = std::fs::canonicalize(path.as_ref())?;
        if !self.entries.contains_key(&key) {
            debug!(path = %key.display(), "Reading schema");
            let text = std::fs::read_to_string(&key)?;
            self.entries.insert(key.clone(), text);
        }
        serde_json::from_str(&self.entries[&key]).map_err(|err| StoreError::InvalidSchema {
            path: key,
            message: err.to_string(),
        })
    }

    /// Returns `true` if the schema at `path` has already been read.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        std::fs::canonicalize(path)
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached file.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
