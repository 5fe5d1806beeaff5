use std::sync::LazyLock;

use regex::Regex;

use crate::core::builtin_regex;

static ENGINE_IMPORT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    builtin_regex(
        "engine import",
        r#"(?m)(?:^|;)\s*@import\s+(?:url\(\s*)?['"]windsmith(?:/[A-Za-z0-9_.\-/]*)?['"]"#,
    )
});

/// A `@theme { ... }` block located in a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ThemeBlock<'a> {
    /// Byte offset of `@theme`
    pub start: usize,
    /// Byte offset just past the closing brace
    pub end: usize,
    /// Text between the braces
    pub body: &'a str,
}

/// A single-statement at-rule such as `@source "../lib";`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum LineDirective {
    EngineImport,
    Import { target: String, statement: String },
    Source { pattern: String, negated: bool },
    Config(String),
}

pub(super) fn imports_engine(css: &str) -> bool {
    ENGINE_IMPORT
        .as_ref()
        .is_some_and(|re| re.is_match(&without_comments(css)))
}

/// Removes `/* ... */` comments that are not inside a string.
pub(super) fn without_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut chars = css.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(quote) = in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for inner in chars.by_ref() {
                    if previous == '*' && inner == '/' {
                        break;
                    }
                    previous = inner;
                }
            }
            '"' | '\'' => {
                in_string = Some(ch);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Splits a line after every `;` that ends a top-level statement.
///
/// Semicolons inside strings, parentheses or blocks do not split, so
/// `@import "a"; .b { color: red; }` yields the import and the rule.
pub(super) fn statements(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut start = 0usize;

    for (idx, ch) in line.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => in_string = Some(ch),
            '{' | '(' => depth += 1,
            '}' | ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                parts.push(&line[start..=idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }

    parts
}

/// Finds top-level `@theme` blocks, skipping nested or commented occurrences.
pub(super) fn theme_blocks(css: &str) -> Vec<ThemeBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel_start) = css[cursor..].find("@theme") {
        let start = cursor + rel_start;
        if !is_top_level(css, start) {
            cursor = start + "@theme".len();
            continue;
        }
        let Some(open_rel) = css[start..].find('{') else {
            break;
        };
        let open = start + open_rel;
        let Some(close) = matching_brace(css, open) else {
            break;
        };
        blocks.push(ThemeBlock {
            start,
            end: close + 1,
            body: &css[open + 1..close],
        });
        cursor = close + 1;
    }

    blocks
}

/// Splits a `@theme` body into `--name: value` declarations, in order.
pub(super) fn declarations(body: &str) -> Vec<(&str, &str)> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut segment_start = 0usize;

    for (idx, ch) in body.char_indices() {
        match ch {
            '{' | '(' => depth += 1,
            '}' | ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                push_declaration(&body[segment_start..idx], &mut declarations);
                segment_start = idx + 1;
            }
            _ => {}
        }
    }
    push_declaration(&body[segment_start..], &mut declarations);

    declarations
}

fn push_declaration<'a>(segment: &'a str, declarations: &mut Vec<(&'a str, &'a str)>) {
    let segment = strip_comments(segment.trim());
    let Some((name, value)) = segment.split_once(':') else {
        return;
    };
    let name = name.trim();
    let value = value.trim();
    if name.starts_with("--") && !value.is_empty() {
        declarations.push((name, value));
    }
}

fn strip_comments(segment: &str) -> &str {
    let mut segment = segment;
    while let Some(rest) = segment.strip_prefix("/*") {
        match rest.find("*/") {
            Some(end) => segment = rest[end + 2..].trim_start(),
            None => return "",
        }
    }
    segment
}

/// Recognizes the one-line directives the engine consumes.
pub(super) fn line_directive(line: &str) -> Option<LineDirective> {
    let trimmed = line.trim();

    if let Some(raw) = trimmed.strip_prefix("@import") {
        if imports_engine(trimmed) {
            return Some(LineDirective::EngineImport);
        }
        return import_target(raw).map(|target| LineDirective::Import {
            target,
            statement: trimmed.to_string(),
        });
    }

    if let Some(raw) = trimmed.strip_prefix("@source") {
        let raw = raw.trim().trim_end_matches(';').trim();
        let (raw, negated) = match raw.strip_prefix("not ") {
            Some(rest) => (rest.trim(), true),
            None => (raw, false),
        };
        return quoted_literal(raw).map(|pattern| LineDirective::Source { pattern, negated });
    }

    if let Some(raw) = trimmed.strip_prefix("@config") {
        let raw = raw.trim().trim_end_matches(';');
        return quoted_literal(raw).map(LineDirective::Config);
    }

    None
}

/// The URL of an `@import`, written either quoted or as `url(...)`.
fn import_target(raw: &str) -> Option<String> {
    let raw = raw.trim_start();
    if let Some(inner) = raw.strip_prefix("url(") {
        let inner = inner[..inner.find(')')?].trim();
        return Some(quoted_literal(inner).unwrap_or_else(|| inner.to_string()));
    }

    let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &raw[1..];
    Some(rest[..rest.find(quote)?].to_string())
}

/// Whether an import target names a file on disk rather than a URL.
pub(super) fn is_local_target(target: &str) -> bool {
    !(target.is_empty()
        || target.contains("://")
        || target.starts_with("//")
        || target.starts_with("data:"))
}

fn quoted_literal(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.len() < 2 {
        return None;
    }
    let quote = trimmed.chars().next()?;
    if (quote != '"' && quote != '\'') || !trimmed.ends_with(quote) {
        return None;
    }
    Some(trimmed[1..trimmed.len() - 1].to_string())
}

fn is_top_level(css: &str, target: usize) -> bool {
    let mut depth = 0usize;
    let mut in_comment = false;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut chars = css.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if idx >= target {
            break;
        }

        if in_comment {
            if ch == '*' && matches!(chars.peek(), Some((_, '/'))) {
                chars.next();
                in_comment = false;
            }
            continue;
        }

        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                in_comment = true;
            }
            '"' | '\'' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    depth == 0 && !in_comment && in_string.is_none()
}

fn matching_brace(css: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_comment = false;
    let mut chars = css[open..].char_indices().peekable();

    while let Some((rel, ch)) = chars.next() {
        if in_comment {
            if ch == '*' && matches!(chars.peek(), Some((_, '/'))) {
                chars.next();
                in_comment = false;
            }
            continue;
        }

        match ch {
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                in_comment = true;
            }
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + rel);
                }
            }
            _ => {}
        }
    }

    None
}
