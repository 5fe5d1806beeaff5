//! CSS variable namespaces and their legacy theme-key aliases.

use toml::{Table, Value};

/// Key used for a value that is both a leaf and a prefix of deeper tokens.
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Namespaces that contain a dash themselves; matched before single-segment ones.
const COMPOUND_NAMESPACES: &[&str] = &[
    "font-weight",
    "inset-shadow",
    "drop-shadow",
    "text-shadow",
    "default-transition-duration",
    "default-transition-timing-function",
];

/// CSS namespace -> legacy theme key.
const NAMESPACE_ALIASES: &[(&str, &str)] = &[
    ("color", "colors"),
    ("font", "fontFamily"),
    ("font-weight", "fontWeight"),
    ("text", "fontSize"),
    ("tracking", "letterSpacing"),
    ("leading", "lineHeight"),
    ("breakpoint", "screens"),
    ("container", "containers"),
    ("radius", "borderRadius"),
    ("shadow", "boxShadow"),
    ("inset-shadow", "insetShadow"),
    ("drop-shadow", "dropShadow"),
    ("text-shadow", "textShadow"),
    ("aspect", "aspectRatio"),
    ("ease", "transitionTimingFunction"),
    ("animate", "animation"),
    ("perspective", "perspective"),
    ("blur", "blur"),
    ("spacing", "spacing"),
];

/// Splits a variable name into its namespace and the remainder.
///
/// `--color-red-500` gives `("color", "red-500")`, `--font-weight-bold` gives
/// `("font-weight", "bold")` and a bare `--spacing` gives `("spacing", "")`.
/// Returns `None` for names that are not custom properties.
pub fn split_variable(name: &str) -> Option<(&str, &str)> {
    let body = name.strip_prefix("--")?;
    if body.is_empty() {
        return None;
    }

    for &compound in COMPOUND_NAMESPACES {
        if let Some(rest) = body.strip_prefix(compound) {
            if rest.is_empty() {
                return Some((compound, ""));
            }
            if let Some(rest) = rest.strip_prefix('-') {
                return Some((compound, rest));
            }
        }
    }

    match body.split_once('-') {
        Some((namespace, rest)) if !namespace.is_empty() => Some((namespace, rest)),
        Some(_) => None,
        None => Some((body, "")),
    }
}

/// The legacy theme key a CSS namespace is exposed under.
pub fn theme_key_for_namespace(namespace: &str) -> &str {
    NAMESPACE_ALIASES
        .iter()
        .find(|(ns, _)| *ns == namespace)
        .map_or(namespace, |(_, key)| *key)
}

/// The CSS namespace backing a theme key or raw namespace segment.
///
/// Aliased keys map to their namespace (`colors` -> `color`); anything else is
/// its own namespace, so `color` maps to `color`.
pub fn namespace_for_segment(segment: &str) -> &str {
    NAMESPACE_ALIASES
        .iter()
        .find(|(_, key)| *key == segment)
        .map_or(segment, |(ns, _)| *ns)
}

/// Whether `segment` is a raw CSS namespace that has a different theme key.
pub fn is_aliased_namespace(segment: &str) -> bool {
    theme_key_for_namespace(segment) != segment
}

/// Turns the remainder of a variable name into a nested key path.
///
/// Single dashes separate nesting levels; a double dash starts a key that is
/// kept whole, so `xs--line-height` gives `["xs", "line-height"]`.
pub fn key_path(remainder: &str) -> Vec<String> {
    if remainder.is_empty() {
        return vec![DEFAULT_KEY.to_string()];
    }

    let mut parts = remainder.split("--");
    let mut path: Vec<String> = parts
        .next()
        .unwrap_or_default()
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect();
    path.extend(parts.filter(|p| !p.is_empty()).map(str::to_owned));

    if path.is_empty() {
        path.push(DEFAULT_KEY.to_string());
    }
    path
}

/// Inserts a value at a key path, moving colliding leaves under `DEFAULT`.
pub fn insert_nested(table: &mut Table, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        match table.get_mut(head) {
            Some(Value::Table(existing)) => {
                existing.insert(DEFAULT_KEY.to_string(), value);
            }
            _ => {
                table.insert(head.clone(), value);
            }
        }
        return;
    }

    let entry = table
        .entry(head.clone())
        .or_insert(Value::Table(Table::new()));

    if !entry.is_table() {
        let leaf = std::mem::replace(entry, Value::Table(Table::new()));
        if let Value::Table(nested) = entry {
            nested.insert(DEFAULT_KEY.to_string(), leaf);
        }
    }

    if let Value::Table(nested) = entry {
        insert_nested(nested, rest, value);
    }
}
