//! Error types for config, schema and document file handling.
//!
//! Wraps the I/O and serialization failures of the file layer together with
//! the engine's own [`DocsError`](schema_docs_core::DocsError).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Flattening or merging failed.
    #[error(transparent)]
    DocsError(#[from] schema_docs_core::DocsError),

    /// Config validation failure (e.g., a model without event names).
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A schema file is not valid JSON.
    #[error("invalid schema {}: {message}", path.display())]
    InvalidSchema { path: PathBuf, message: String },

    /// The persisted documentation file could not be parsed.
    #[error("invalid documentation file {}: {message}", path.display())]
    InvalidDocument { path: PathBuf, message: String },
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
