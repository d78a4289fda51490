//! Error taxonomy for schema flattening and document merging.
//!
//! Every variant is fatal for the unit of work that raised it: a schema, a
//! filter list, a model, or a persisted document. Nothing in the core skips
//! a field and carries on, because a dropped leaf would silently produce an
//! incomplete column set.

use thiserror::Error;

/// Errors raised by the flattening and merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocsError {
    /// A field declares neither `type` nor `enum`, or its declaration cannot
    /// be resolved to a column type.
    #[error("schema error at `{path}`: {message}")]
    Schema { path: String, message: String },

    /// A filter expression could not be compiled.
    #[error("invalid filter `{expression}`: {message}")]
    Filter { expression: String, message: String },

    /// A persisted document does not have the expected structure.
    #[error("invalid document: {0}")]
    Merge(String),

    /// The inputs for one model are inconsistent (alias or event name counts).
    #[error("invalid model input: {0}")]
    Model(String),
}

impl DocsError {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn filter(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Filter {
            expression: expression.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for results with [`DocsError`].
pub type Result<T> = std::result::Result<T, DocsError>;
