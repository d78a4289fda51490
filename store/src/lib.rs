//! File handling for the schema documentation generator.
//!
//! The core engine works on in-memory values; this crate provides the parts
//! that touch the filesystem:
//!
//! - [`GeneratorConfig`]: the YAML/JSON configuration listing the models.
//! - [`SchemaCache`]: an explicit, caller-owned cache of schema files.
//! - [`load_document`] / [`save_document`]: the YAML documentation file,
//!   written atomically.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_docs_core::apply_models;
//! use schema_docs_store::{GeneratorConfig, SchemaCache, load_document, save_document};
//!
//! let config = GeneratorConfig::load("schema-docs.yml").unwrap();
//! let mut cache = SchemaCache::new();
//! let inputs = config.model_inputs(&mut cache).unwrap();
//!
//! let existing = load_document("models/schema.yml").unwrap();
//! if let Some(document) = apply_models(existing, &inputs).unwrap() {
//!     save_document("models/schema.yml", &document).unwrap();
//! }
//! ```

mod cache;
mod config;
mod document;
mod error;

pub use cache::SchemaCache;
pub use config::{GeneratorConfig, ModelConfig};
pub use document::{load_document, render_document, save_document};
pub use error::{Result, StoreError};
