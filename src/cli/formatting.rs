//! Formatting utilities for CLI output.

use serde::Serialize;

use crate::session::{Diagnostic, Severity};

/// ANSI color codes for terminal output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Dim text
    pub const DIM: &'static str = "\x1b[2m";
    /// Red color
    pub const RED: &'static str = "\x1b[31m";
    /// Yellow color
    pub const YELLOW: &'static str = "\x1b[33m";
}

/// Formats error messages with red styling
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// Formats warnings with yellow styling
pub fn format_warning(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::YELLOW, text, Colors::RESET)
}

/// Formats secondary details with muted styling
pub fn format_detail(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

/// Formats a diagnostic as `label: message`, followed by its path when known.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Warning => format_warning("warning"),
        Severity::Error => format_error("error"),
    };

    match &diagnostic.path {
        Some(path) => format!(
            "{label}: {}\n  {}",
            diagnostic.message,
            format_detail(&path.display().to_string())
        ),
        None => format!("{label}: {}", diagnostic.message),
    }
}

/// Candidates found in a project, as printed by `candidates --json`.
#[derive(Debug, Serialize)]
pub struct CandidateReport<'a> {
    /// Number of source files scanned
    pub files: usize,
    /// Candidates in sorted order
    pub candidates: Vec<&'a str>,
}

/// Formats candidates one per line, or as a JSON [`CandidateReport`].
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn format_candidates(report: &CandidateReport<'_>, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(report);
    }
    Ok(report.candidates.join("\n"))
}
