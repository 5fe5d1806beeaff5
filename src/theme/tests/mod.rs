//! Unit tests for theme resolution
//!
//! Layers are built in memory; deferred values are plain closures.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use toml::{Table, Value};

use crate::config::{ConfigError, ConfigLayer, ConfigValue, Deferred, LayerStack};
use crate::theme::{ThemeStore, resolve_theme};

fn layer(source: &str) -> ConfigLayer {
    ConfigLayer::from_toml_str(source, "/root").unwrap()
}

fn layer_with(source: &str, deferred: Vec<(&str, Deferred)>) -> ConfigLayer {
    let table: Table = toml::from_str(source).unwrap();
    let mut config = ConfigValue::from_toml(Value::Table(table));
    for (path, value) in deferred {
        config.set_path(path, value.into()).unwrap();
    }
    ConfigLayer::new(config, "/root")
}

fn stack(layers: Vec<ConfigLayer>) -> LayerStack {
    layers.into_iter().collect()
}

fn str_at<'a>(table: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = table;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

fn spread_with(source: &'static str, key: &'static str, value: &'static str) -> Deferred {
    Deferred::new(move |theme| {
        let mut table = theme.table(source)?;
        table.insert(key.to_string(), Value::String(value.to_string()));
        Ok(Value::Table(table))
    })
}

#[test]
fn top_level_theme_keys_are_replaced() {
    let layers = stack(vec![
        layer("[theme.colors]\nred = \"red\"\n[theme.fontFamily]\nsans = \"SF Pro Display\"\n"),
        layer("[theme.colors]\ngreen = \"green\"\n"),
        layer("[theme.colors]\nblue = \"blue\"\n"),
    ]);

    let theme = resolve_theme(&ThemeStore::new(), &layers).unwrap().into_value();

    let colors = theme.get("colors").and_then(Value::as_table).unwrap();
    assert_eq!(colors.len(), 1);
    assert_eq!(str_at(&theme, &["colors", "blue"]), Some("blue"));
    assert_eq!(str_at(&theme, &["fontFamily", "sans"]), Some("SF Pro Display"));
}

#[test]
fn theme_can_be_extended() {
    let layers = stack(vec![
        layer("[theme.colors]\nred = \"red\"\n[theme.fontFamily]\nsans = \"SF Pro Display\"\n"),
        layer("[theme.extend.colors]\nblue = \"blue\"\n"),
    ]);

    let theme = resolve_theme(&ThemeStore::new(), &layers).unwrap().into_value();

    assert_eq!(str_at(&theme, &["colors", "red"]), Some("red"));
    assert_eq!(str_at(&theme, &["colors", "blue"]), Some("blue"));
    assert_eq!(str_at(&theme, &["fontFamily", "sans"]), Some("SF Pro Display"));
}

#[test]
fn replace_applies_before_extend_within_a_layer() {
    let layers = stack(vec![
        layer("[theme.colors]\ngreen = \"green\"\n"),
        layer("[theme.colors]\nred = \"red\"\n[theme.extend.colors]\nblue = \"blue\"\n"),
    ]);

    let theme = resolve_theme(&ThemeStore::new(), &layers).unwrap();
    let colors = theme.get("colors").and_then(Value::as_table).unwrap();

    assert_eq!(colors.keys().collect::<Vec<_>>(), vec!["blue", "red"]);
}

#[test]
fn extend_deep_merges_nested_tables() {
    let layers = stack(vec![
        layer("[theme.colors.red]\n100 = \"#fee\"\n500 = \"#f00\"\n"),
        layer("[theme.extend.colors.red]\n500 = \"#e00\"\n900 = \"#300\"\n"),
    ]);

    let theme = resolve_theme(&ThemeStore::new(), &layers).unwrap();

    assert_eq!(theme.get("colors.red.100").and_then(Value::as_str), Some("#fee"));
    assert_eq!(theme.get("colors.red.500").and_then(Value::as_str), Some("#e00"));
    assert_eq!(theme.get("colors.red.900").and_then(Value::as_str), Some("#300"));
}

#[test]
fn theme_keys_reference_each_other_regardless_of_order() {
    let layers = stack(vec![
        layer("[theme.colors]\nred = \"red\"\n[theme.placeholderColor]\ngreen = \"green\"\n"),
        layer_with(
            "",
            vec![(
                "theme.extend.colors",
                spread_with("placeholderColor", "blue", "blue"),
            )],
        ),
        layer_with(
            "",
            vec![
                ("theme.extend.caretColor", Deferred::reference("accentColor")),
                ("theme.extend.accentColor", Deferred::reference("backgroundColor")),
                ("theme.extend.backgroundColor", Deferred::reference("colors")),
            ],
        ),
    ]);

    let theme = resolve_theme(&ThemeStore::new(), &layers).unwrap().into_value();

    for key in ["colors", "accentColor", "backgroundColor", "caretColor"] {
        assert_eq!(str_at(&theme, &[key, "red"]), Some("red"), "{key}.red");
        assert_eq!(str_at(&theme, &[key, "green"]), Some("green"), "{key}.green");
        assert_eq!(str_at(&theme, &[key, "blue"]), Some("blue"), "{key}.blue");
    }
}

#[test]
fn theme_keys_read_from_the_store() {
    let store: ThemeStore = [("--color-green", "green")].into_iter().collect();

    let layers = stack(vec![layer_with(
        "",
        vec![
            ("theme.colors", spread_with("color", "red", "red")),
            (
                "theme.accentColor",
                Deferred::new(|theme| Ok(Value::Table(theme.table("colors")?))),
            ),
            ("theme.placeholderColor.primary", Deferred::reference("colors.green")),
            ("theme.placeholderColor.secondary", Deferred::reference("color.green")),
        ],
    )]);

    let theme = resolve_theme(&store, &layers).unwrap().into_value();

    assert_eq!(str_at(&theme, &["colors", "red"]), Some("red"));
    assert_eq!(str_at(&theme, &["colors", "green"]), Some("green"));
    assert_eq!(str_at(&theme, &["accentColor", "red"]), Some("red"));
    assert_eq!(str_at(&theme, &["accentColor", "green"]), Some("green"));
    assert_eq!(str_at(&theme, &["placeholderColor", "primary"]), Some("green"));
    assert_eq!(str_at(&theme, &["placeholderColor", "secondary"]), Some("green"));
}

#[test]
fn store_tokens_are_bridged_without_any_layer() {
    let store: ThemeStore = [
        ("--color-green", "green"),
        ("--color-red-500", "#ef4444"),
        ("--font-sans", "Inter"),
        ("--brand-primary", "#123456"),
    ]
    .into_iter()
    .collect();

    let theme = resolve_theme(&store, &LayerStack::new()).unwrap();

    assert_eq!(theme.get("colors.green").and_then(Value::as_str), Some("green"));
    assert_eq!(theme.get("colors.red.500").and_then(Value::as_str), Some("#ef4444"));
    assert_eq!(theme.get("fontFamily.sans").and_then(Value::as_str), Some("Inter"));
    assert_eq!(theme.get("brand.primary").and_then(Value::as_str), Some("#123456"));
    assert!(theme.get("color").is_none());
}

#[test]
fn layer_entries_win_over_store_tokens() {
    let store: ThemeStore = [("--color-red", "#f00"), ("--color-blue", "#00f")]
        .into_iter()
        .collect();
    let layers = stack(vec![layer("[theme.colors]\nred = \"red\"\n")]);

    let theme = resolve_theme(&store, &layers).unwrap();

    assert_eq!(theme.get("colors.red").and_then(Value::as_str), Some("red"));
    assert_eq!(theme.get("colors.blue").and_then(Value::as_str), Some("#00f"));
}

#[test]
fn toml_theme_references_are_deferred() {
    let layers = stack(vec![
        layer("[theme.extend]\nborderColor = \"theme(colors)\"\n"),
        layer("[theme.colors]\nred = \"red\"\n"),
    ]);

    let theme = resolve_theme(&ThemeStore::new(), &layers).unwrap();
    assert_eq!(theme.get("borderColor.red").and_then(Value::as_str), Some("red"));
}

#[test]
fn cycles_are_reported_with_their_chain() {
    let layers = stack(vec![layer("[theme]\na = \"theme(b)\"\nb = \"theme(a)\"\n")]);

    match resolve_theme(&ThemeStore::new(), &layers).unwrap_err() {
        ConfigError::CircularReference { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
        other => panic!("expected CircularReference, got {other:?}"),
    }
}

#[test]
fn self_reference_is_a_cycle() {
    let layers = stack(vec![layer("[theme]\ncolors = \"theme(colors)\"\n")]);

    let err = resolve_theme(&ThemeStore::new(), &layers).unwrap_err();
    assert!(matches!(err, ConfigError::CircularReference { .. }));
}

#[test]
fn deferred_values_are_computed_once_per_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let layers = stack(vec![layer_with(
        "[theme.extend]\nborderColor = \"theme(colors)\"\noutlineColor = \"theme(colors)\"\n",
        vec![(
            "theme.colors",
            Deferred::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Table(Table::new()))
            }),
        )],
    )]);

    resolve_theme(&ThemeStore::new(), &layers).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn deferred_errors_propagate() {
    let layers = stack(vec![layer_with(
        "",
        vec![(
            "theme.colors",
            Deferred::new(|_| {
                Err(ConfigError::DeferredFailed {
                    key: "colors".to_string(),
                    details: "boom".to_string(),
                })
            }),
        )],
    )]);

    let err = resolve_theme(&ThemeStore::new(), &layers).unwrap_err();
    assert!(matches!(err, ConfigError::DeferredFailed { .. }));
}

#[test]
fn dangling_reference_is_an_invalid_path() {
    let layers = stack(vec![layer("[theme]\nringColor = \"theme(nope)\"\n")]);

    let err = resolve_theme(&ThemeStore::new(), &layers).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPath(_)));
}

#[test]
fn malformed_layer_is_rejected() {
    let layers = stack(vec![
        layer("[theme.colors]\nred = \"red\"\n"),
        ConfigLayer::new(ConfigValue::from("nope"), "/elsewhere"),
    ]);

    match resolve_theme(&ThemeStore::new(), &layers).unwrap_err() {
        ConfigError::MalformedLayer { index, .. } => assert_eq!(index, 1),
        other => panic!("expected MalformedLayer, got {other:?}"),
    }
}

#[test]
fn resolution_is_deterministic() {
    let store: ThemeStore = [("--color-green", "green"), ("--spacing", "0.25rem")]
        .into_iter()
        .collect();
    let layers = stack(vec![
        layer("[theme.colors]\nred = \"red\"\n"),
        layer("[theme.extend.spacing]\nlg = \"2rem\"\n"),
    ]);

    let first = resolve_theme(&store, &layers).unwrap();
    let second = resolve_theme(&store, &layers).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.get("spacing.DEFAULT").and_then(Value::as_str), Some("0.25rem"));
}
