//! Unit tests for config layers
//!
//! No filesystem dependencies - all in-memory.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ConfigLayer, ConfigValue, LayerStack};

#[test]
fn layer_from_toml_str_keeps_base() {
    let layer = ConfigLayer::from_toml_str("[theme.colors]\nred = \"red\"\n", "/root").unwrap();

    assert_eq!(layer.base(), Path::new("/root"));
    assert!(layer.origin().is_none());
    assert!(layer.theme_section(0).unwrap().is_some());
}

#[test]
fn layer_without_theme_has_no_section() {
    let layer = ConfigLayer::from_toml_str("content = []\n", "/root").unwrap();
    assert!(layer.theme_section(0).unwrap().is_none());
}

#[test]
fn non_table_layer_is_malformed() {
    let layer = ConfigLayer::new(ConfigValue::from("not a table"), "/root");

    match layer.theme_section(3).unwrap_err() {
        ConfigError::MalformedLayer { index, base, .. } => {
            assert_eq!(index, 3);
            assert_eq!(base, PathBuf::from("/root"));
        }
        other => panic!("expected MalformedLayer, got {other:?}"),
    }
}

#[test]
fn non_table_theme_is_malformed() {
    let layer = ConfigLayer::from_toml_str("theme = \"dark\"\n", "/root").unwrap();
    assert!(matches!(
        layer.theme_section(0),
        Err(ConfigError::MalformedLayer { .. })
    ));
}

#[test]
fn non_table_extend_is_malformed() {
    let layer = ConfigLayer::from_toml_str("[theme]\nextend = 4\n", "/root").unwrap();
    assert!(matches!(
        layer.theme_section(0),
        Err(ConfigError::MalformedLayer { .. })
    ));
}

#[test]
fn invalid_toml_string_fails_to_parse() {
    let result = ConfigLayer::from_toml_str("theme = {", "/root");
    assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
}

#[test]
fn content_globs_from_array() {
    let layer = ConfigLayer::from_toml_str(
        "content = [\"../project-b/src/**/*.js\", \"!**/*.test.js\"]\n",
        "/work/project-a",
    )
    .unwrap();

    let globs = layer.content_globs();
    assert_eq!(globs.len(), 2);
    assert_eq!(globs[0].pattern, "../project-b/src/**/*.js");
    assert!(!globs[0].negated);
    assert_eq!(globs[0].base, PathBuf::from("/work/project-a"));
    assert_eq!(globs[1].pattern, "**/*.test.js");
    assert!(globs[1].negated);
}

#[test]
fn content_globs_from_files_table() {
    let layer =
        ConfigLayer::from_toml_str("[content]\nfiles = [\"src/**/*.html\"]\n", "/work").unwrap();

    let globs = layer.content_globs();
    assert_eq!(globs.len(), 1);
    assert_eq!(globs[0].pattern, "src/**/*.html");
}

#[test]
fn stack_collects_content_globs_in_layer_order() {
    let stack: LayerStack = [
        ConfigLayer::from_toml_str("content = [\"a/**\"]\n", "/one").unwrap(),
        ConfigLayer::from_toml_str("content = [\"b/**\"]\n", "/two").unwrap(),
    ]
    .into_iter()
    .collect();

    let globs = stack.content_globs();
    assert_eq!(globs.len(), 2);
    assert_eq!(globs[0].base, PathBuf::from("/one"));
    assert_eq!(globs[1].base, PathBuf::from("/two"));
}

#[test]
fn presets_are_listed_in_order() {
    let layer =
        ConfigLayer::from_toml_str("presets = [\"./base\", \"brand.toml\"]\n", "/root").unwrap();
    assert_eq!(layer.presets(), vec!["./base", "brand.toml"]);
}
