//! Error types for template loading and variable parsing.
//!
//! Rendering itself never fails. These errors come from the edges: resolving
//! a template by name, reading template directories, and turning JSON or YAML
//! documents into [`Variables`](crate::Variables).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading templates or variable mappings.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template is registered under the requested name.
    #[error("template not found: \"{name}\"")]
    NotFound { name: String },

    /// Two template directories provide a template with the same name.
    #[error(
        "template collision for \"{name}\":\n  - {}\n  - {}",
        existing.display(),
        conflicting.display()
    )]
    Collision {
        name: String,
        existing: PathBuf,
        conflicting: PathBuf,
    },

    /// Reading a template file or directory failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The variable document has the wrong shape (e.g. a top-level array).
    #[error("invalid variables: {0}")]
    InvalidVariables(String),

    /// JSON variable document could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML variable document could not be parsed.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for template loading operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
