//! Error types for template parsing and rendering

use std::path::PathBuf;
use thiserror::Error;

/// Error type for template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Failed to read a template file
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to walk the data directory
    #[error("failed to walk data directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A template failed to parse
    #[error("template syntax error: {0}")]
    Syntax(#[source] minijinja::Error),

    /// No template by that name, in any applicable environment
    #[error("template not found: {0}")]
    NotFound(String),

    /// Rendering failed
    #[error("template render failed: {0}")]
    Render(#[source] minijinja::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
