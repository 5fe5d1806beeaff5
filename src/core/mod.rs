use std::{fmt, path::PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

/// Error types for windsmith.
///
/// Everything that can go wrong between reading a root stylesheet and
/// delivering generated CSS. Whether an error aborts the session depends on
/// the [`BuildMode`]; see [`WindsmithError::is_fatal_for`].
#[derive(Error, Debug)]
pub enum WindsmithError {
    /// Theme or config layer resolution failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A source file could not be read or tokenized
    #[error("failed to extract candidates from '{path}': {details}")]
    Extraction {
        /// File being extracted
        path: PathBuf,
        /// Extraction error details
        details: String,
    },

    /// The generator failed to produce a stylesheet
    #[error("stylesheet generation failed: {details}")]
    Generation {
        /// Generator error details
        details: String,
    },

    /// A path could not be watched
    #[error("failed to watch '{path}': {details}")]
    Watch {
        /// Path that could not be watched
        path: PathBuf,
        /// Watcher error details
        details: String,
    },

    /// A source glob could not be compiled
    #[error("invalid source glob '{pattern}': {details}")]
    InvalidGlob {
        /// The offending pattern
        pattern: String,
        /// Glob compilation error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The session driver has shut down
    #[error("build session is closed")]
    SessionClosed,
}

/// A specialized `Result` type for windsmith operations.
pub type Result<T> = std::result::Result<T, WindsmithError>;

/// How a build session delivers its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    /// Build once and exit
    Build,
    /// Build, then rebuild whenever sources change
    Watch,
    /// Serve stylesheets per request for a dev server
    Dev,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Build => write!(f, "build"),
            BuildMode::Watch => write!(f, "watch"),
            BuildMode::Dev => write!(f, "dev"),
        }
    }
}

impl WindsmithError {
    /// Whether this error must abort a session running in `mode`.
    ///
    /// Only config errors are fatal, and only for one-shot builds. Watch and
    /// dev sessions report everything as a diagnostic and keep running.
    pub fn is_fatal_for(&self, mode: BuildMode) -> bool {
        matches!(self, WindsmithError::Config(_)) && mode == BuildMode::Build
    }

    /// Creates an extraction error for `path`.
    pub fn extraction(path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        WindsmithError::Extraction {
            path: path.into(),
            details: error.to_string(),
        }
    }

    /// Creates a watch error for `path`.
    pub fn watch(path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        WindsmithError::Watch {
            path: path.into(),
            details: error.to_string(),
        }
    }
}

/// Compiles one of the crate's built-in patterns.
///
/// A pattern that fails to compile is logged at `error` and yields `None`;
/// callers then behave as if nothing matched.
pub(crate) fn builtin_regex(name: &'static str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            error!(pattern = name, error = %err, "Built-in pattern failed to compile");
            None
        }
    }
}
