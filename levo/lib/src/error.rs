//! Error types for the levo generator.

use std::path::PathBuf;

use strum::Display;
use thiserror::Error;

/// The kind of named entity a lookup or uniqueness check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Model,
    Property,
    Template,
}

/// Errors that can occur while building generator state or running a generation.
#[derive(Debug, Error)]
pub enum LevoError {
    /// A model or template lookup missed.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    /// A name collided with one that is already registered.
    #[error("attempted to add duplicate {kind} with name '{name}'")]
    Duplicate { kind: EntityKind, name: String },

    /// A required field was missing or a precondition failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The renderer rejected a template's source.
    #[error("failed to parse template '{name}': {reason}")]
    Parse { name: String, reason: String },

    /// The schema document was not valid JSON for the expected shape.
    #[error("failed to parse schema document: {0}")]
    Schema(#[from] serde_json::Error),

    /// The renderer failed while executing a template.
    #[error("failed to render template '{name}': {reason}")]
    Render { name: String, reason: String },

    /// Reading a schema or template file failed.
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A passthrough body carried invalid base64.
    #[error("failed to decode passthrough body: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Walking a template directory failed.
    #[error("failed to walk template directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl LevoError {
    pub(crate) fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, LevoError>;
