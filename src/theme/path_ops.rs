use toml::Value;

use crate::config::ConfigError;

/// Splits a theme path into segments.
///
/// Segments are separated by dots; a bracketed segment is taken literally so
/// keys containing dots can be addressed: `spacing[2.5]` gives
/// `["spacing", "2.5"]`. Surrounding quotes are ignored.
///
/// # Errors
/// * `ConfigError::InvalidPath` - If the path is empty or has an unclosed bracket
pub fn split_path(path: &str) -> Result<Vec<String>, ConfigError> {
    let path = path.trim().trim_matches(|c| c == '\'' || c == '"');
    if path.is_empty() {
        return Err(ConfigError::InvalidPath("Empty path".to_string()));
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let mut literal = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    literal.push(c);
                }
                if !closed {
                    return Err(ConfigError::InvalidPath(format!(
                        "Unclosed '[' in path '{path}'"
                    )));
                }
                segments.push(literal);
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    if segments.is_empty() {
        return Err(ConfigError::InvalidPath(format!("No segments in path '{path}'")));
    }

    Ok(segments)
}

/// Navigates through a value following already-split segments
///
/// Tables are indexed by key and arrays by numeric index. Returns `None`
/// when any segment is missing.
pub fn navigate<'a, S: AsRef<str>>(value: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = value;

    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Value::Table(table) => table.get(segment)?,
            Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
