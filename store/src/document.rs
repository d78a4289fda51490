//! Reading and writing the YAML documentation file.
//!
//! A missing (or empty) file means there is no document yet. Writes go to a
//! temporary file in the target directory which is then renamed over the
//! target, so an interrupted run leaves the previous file intact.

use std::io::Write;
use std::path::Path;

use schema_docs_core::{DocsError, Document};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Loads the documentation file at `path`.
///
/// Returns `Ok(None)` when the file does not exist or holds no YAML value.
///
/// # Errors
///
/// Returns [`StoreError::IoError`] if the file exists but cannot be read, and
/// [`StoreError::InvalidDocument`] if it is not YAML or does not have the
/// document structure.
///
/// # Examples
///
/// ```
/// let missing = schema_docs_store::load_document("does/not/exist.yml").unwrap();
/// assert!(missing.is_none());
/// ```
pub fn load_document(path: impl AsRef<Path>) -> Result<Option<Document>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "No documentation file yet");
        return Ok(None);
    }

    let text = std::fs::read_to_string(path)?;
    let invalid = |message: String| StoreError::InvalidDocument {
        path: path.to_path_buf(),
        message,
    };
    let value: Value = serde_yaml::from_str(&text).map_err(|err| invalid(err.to_string()))?;
    if value.is_null() {
        return Ok(None);
    }
    let document = Document::from_value(value).map_err(|err| match err {
        DocsError::Merge(message) => invalid(message),
        other => invalid(other.to_string()),
    })?;
    debug!(path = %path.display(), tables = document.tables.len(), "Loaded documentation file");
    Ok(Some(document))
}

/// Renders `document` as YAML.
///
/// # Errors
///
/// Returns [`StoreError::YamlError`] if serialization fails.
pub fn render_document(document: &Document) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Writes `document` to `path` as YAML, creating parent directories.
///
/// # Errors
///
/// Returns [`StoreError::IoError`] if the file cannot be written, or
/// [`StoreError::YamlError`] if serialization fails. On error the previous
/// file, if any, is unchanged.
pub fn save_document(path: impl AsRef<Path>, document: &Document) -> Result<()> {
    let path = path.as_ref();
    let rendered = render_document(document)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(rendered.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;

    info!(path = %path.display(), tables = document.tables.len(), "Wrote documentation file");
    Ok(())
}
