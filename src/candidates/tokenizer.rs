use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

use super::Extractor;
use crate::core::builtin_regex;

// Bracketed values may hold quotes and one level of nested brackets, so
// `content-['a/b.js']` and `grid-cols-[[a]_1fr]` stay whole.
static CANDIDATE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    builtin_regex(
        "candidate run",
        r"(?:[A-Za-z0-9_!@\-\(\)#%.,:/*&+~>]|\[(?:[^\[\]\s]|\[[^\[\]\s]*\])*\])+",
    )
});

/// Lexical class tokenizer.
///
/// Finds runs of class-like characters anywhere in the file, then keeps the
/// ones that could plausibly be a utility: a letter somewhere, balanced
/// brackets and parentheses, and no leading `.`, `/` or `#` or trailing `:`.
/// It over-approximates; the generator decides what is a real utility.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassTokenizer;

impl Extractor for ClassTokenizer {
    fn extract(&self, contents: &str) -> BTreeSet<String> {
        let Some(run) = CANDIDATE_RUN.as_ref() else {
            return BTreeSet::new();
        };

        run.find_iter(contents)
            .map(|m| trim_punctuation(m.as_str()))
            .filter(|token| is_plausible(token))
            .map(str::to_owned)
            .collect()
    }
}

fn trim_punctuation(token: &str) -> &str {
    token.trim_end_matches([',', '.', '>']).trim_start_matches('>')
}

fn is_plausible(token: &str) -> bool {
    if token.is_empty()
        || token.starts_with(['.', '/', '#', ',', ':'])
        || token.ends_with([':', '-', '/'])
        || token.contains("//")
        || !token.chars().any(|c| c.is_ascii_alphabetic())
    {
        return false;
    }

    let mut brackets = 0i32;
    let mut parens = 0i32;
    for c in token.chars() {
        match c {
            '[' => brackets += 1,
            ']' => brackets -= 1,
            '(' => parens += 1,
            ')' => parens -= 1,
            _ => {}
        }
        if brackets < 0 || parens < 0 {
            return false;
        }
    }
    brackets == 0 && parens == 0
}
