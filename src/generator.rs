//! Stylesheet generation.
//!
//! The session only depends on the [`Generator`] trait. The bundled
//! [`ThemeManifestGenerator`] writes the resolved theme as custom properties
//! and one marker rule per candidate, which is enough to drive builds end to
//! end and to observe exactly what a real rule generator would receive.

use std::fmt::Write;

use toml::Value;

use crate::{candidates::CandidateSnapshot, core::WindsmithError, theme::ResolvedTheme};

/// Turns a resolved theme and a candidate snapshot into stylesheet text.
///
/// Implementations must be deterministic, and monotonic in the candidate
/// set: adding candidates never removes output for the ones already present.
pub trait Generator: Send + Sync {
    /// Generates the stylesheet.
    ///
    /// # Errors
    /// Returns `WindsmithError::Generation` when no stylesheet can be produced.
    fn generate(
        &self,
        theme: &ResolvedTheme,
        candidates: &CandidateSnapshot,
    ) -> Result<String, WindsmithError>;
}

/// Default generator emitting theme variables plus one rule per candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeManifestGenerator;

impl Generator for ThemeManifestGenerator {
    fn generate(
        &self,
        theme: &ResolvedTheme,
        candidates: &CandidateSnapshot,
    ) -> Result<String, WindsmithError> {
        let mut variables = Vec::new();
        for (key, value) in theme.as_table() {
            flatten(&kebab_case(key), value, &mut variables);
        }

        let mut css = String::new();
        let write_err = |err: std::fmt::Error| WindsmithError::Generation {
            details: err.to_string(),
        };

        if !variables.is_empty() {
            css.push_str(":root {\n");
            for (name, value) in &variables {
                writeln!(css, "  --{name}: {value};").map_err(write_err)?;
            }
            css.push_str("}\n");
        }

        for candidate in candidates.iter() {
            writeln!(css, ".{} {{ --ws-candidate: 1; }}", escape_class(candidate))
                .map_err(write_err)?;
        }

        Ok(css)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Table(table) => {
            for (key, child) in table {
                let name = if key == crate::theme::DEFAULT_KEY {
                    prefix.to_string()
                } else {
                    format!("{prefix}-{}", kebab_case(key))
                };
                flatten(&name, child, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar)
                .collect::<Vec<_>>()
                .join(", ");
            out.push((prefix.to_string(), joined));
        }
        other => out.push((prefix.to_string(), scalar(other))),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else if c == '.' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

/// Escapes a candidate for use as a class selector.
fn escape_class(candidate: &str) -> String {
    let mut escaped = String::with_capacity(candidate.len() * 2);
    for (idx, c) in candidate.chars().enumerate() {
        if idx == 0 && c.is_ascii_digit() {
            write!(escaped, "\\3{c} ").ok();
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
