use std::{fmt, path::Path, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading configuration layers or resolving the theme.
///
/// Every variant is fatal for a one-shot build and a diagnostic for watch
/// and dev sessions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A layer's config is not a mapping, or its `theme` section is not one
    #[error("malformed config layer #{index} (base '{base}'): {details}")]
    MalformedLayer {
        /// Position of the layer in the stack
        index: usize,
        /// Base path the layer was declared with
        base: PathBuf,
        /// What is wrong with the layer
        details: String,
    },

    /// A deferred theme function referenced a key that is still being resolved
    #[error("circular theme reference: {}", chain.join(" -> "))]
    CircularReference {
        /// Theme keys in the order they were entered, ending with the repeated key
        chain: Vec<String>,
    },

    /// A deferred theme function returned an error of its own
    #[error("deferred value for theme key '{key}' failed: {details}")]
    DeferredFailed {
        /// Theme key whose value was being computed
        key: String,
        /// Error details from the function
        details: String,
    },

    /// A theme path could not be parsed or navigated
    #[error("invalid theme path: {0}")]
    InvalidPath(String),

    /// Failed to parse TOML content
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParse {
        /// Location of the TOML (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// A referenced config or preset file could not be loaded
    #[error("failed to import '{path}': {details}")]
    Import {
        /// Path of the file being imported
        path: PathBuf,
        /// Import error details
        details: String,
    },

    /// Presets import each other
    #[error("circular preset import: {}", chain.join(" -> "))]
    CircularImport {
        /// File names along the import chain, ending with the repeated file
        chain: Vec<String>,
    },

    /// I/O failure while reading a config file
    #[error("I/O error on '{path}': {details}")]
    Io {
        /// Path where the I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },
}

impl ConfigError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => p.to_string_lossy().to_string(),
            None => "string".to_string(),
        };

        ConfigError::TomlParse {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an import error with file path context.
    pub fn import(error: impl fmt::Display, path: &Path) -> Self {
        let clean_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        ConfigError::Import {
            path: clean_path,
            details: error.to_string(),
        }
    }
}
