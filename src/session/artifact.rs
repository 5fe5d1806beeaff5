use std::{fmt, path::PathBuf};

use crate::core::WindsmithError;

/// The latest stylesheet and the inputs it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    css: String,
    theme_revision: u64,
    candidates_revision: u64,
    passthrough: bool,
}

impl BuildArtifact {
    pub(crate) fn generated(css: String, theme_revision: u64, candidates_revision: u64) -> Self {
        Self {
            css,
            theme_revision,
            candidates_revision,
            passthrough: false,
        }
    }

    pub(crate) fn passthrough(css: String, theme_revision: u64, candidates_revision: u64) -> Self {
        Self {
            css,
            theme_revision,
            candidates_revision,
            passthrough: true,
        }
    }

    /// Stylesheet text.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Revision of the theme inputs this artifact was built from.
    pub fn theme_revision(&self) -> u64 {
        self.theme_revision
    }

    /// Revision of the candidate set this artifact was built from.
    pub fn candidates_revision(&self) -> u64 {
        self.candidates_revision
    }

    /// Whether the root was not a compilation root and its content was passed through.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Whether this artifact can be reused verbatim for the given inputs.
    pub fn is_current(&self, theme_revision: u64, candidates_revision: u64) -> bool {
        self.theme_revision == theme_revision && self.candidates_revision == candidates_revision
    }
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The session keeps running with its previous state
    Warning,
    /// The session could not continue
    Error,
}

/// A problem reported while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious the problem is
    pub severity: Severity,
    /// File the problem relates to, when known
    pub path: Option<PathBuf>,
    /// Human readable description
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn warning(error: &WindsmithError) -> Self {
        Self::from_error(error, Severity::Warning)
    }

    pub(crate) fn error(error: &WindsmithError) -> Self {
        Self::from_error(error, Severity::Error)
    }

    fn from_error(error: &WindsmithError, severity: Severity) -> Self {
        let path = match error {
            WindsmithError::Extraction { path, .. } | WindsmithError::Watch { path, .. } => {
                Some(path.clone())
            }
            _ => None,
        };

        Self {
            severity,
            path,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}", self.message)
    }
}
