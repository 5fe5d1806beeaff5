use std::{collections::BTreeMap, fmt, sync::Arc, sync::LazyLock};

use regex::Regex;
use toml::Value;

use super::ConfigError;
use crate::{core::builtin_regex, theme::ThemeAccessor};

static THEME_REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    builtin_regex(
        "theme reference",
        r#"^\s*theme\(\s*['"]?([A-Za-z0-9_.\-]+)['"]?\s*\)\s*$"#,
    )
});

type ThemeFn = dyn Fn(&ThemeAccessor<'_>) -> Result<Value, ConfigError> + Send + Sync;

/// A theme value computed from other theme keys at resolution time.
///
/// The function receives a [`ThemeAccessor`] and may call it for any key,
/// regardless of which layer defines that key or in which order.
#[derive(Clone)]
pub struct Deferred(Arc<ThemeFn>);

impl Deferred {
    /// Wraps a closure as a deferred theme value.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ThemeAccessor<'_>) -> Result<Value, ConfigError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A deferred value that evaluates to whatever `theme(path)` resolves to.
    pub fn reference(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(move |theme| {
            theme.get(&path)?.ok_or_else(|| {
                ConfigError::InvalidPath(format!("theme('{path}') does not resolve to a value"))
            })
        })
    }

    pub(crate) fn call(&self, accessor: &ThemeAccessor<'_>) -> Result<Value, ConfigError> {
        (self.0)(accessor)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// A value inside a config layer, before theme resolution.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    /// Any non-table value (strings, numbers, arrays, ...)
    Literal(Value),
    /// A nested mapping
    Table(BTreeMap<String, ConfigValue>),
    /// A value computed lazily from other theme keys
    Deferred(Deferred),
}

impl ConfigValue {
    /// An empty table.
    pub fn empty_table() -> Self {
        ConfigValue::Table(BTreeMap::new())
    }

    /// Converts a parsed TOML value.
    ///
    /// Strings of the exact form `theme(<path>)` become deferred references.
    pub fn from_toml(value: Value) -> Self {
        match value {
            Value::Table(table) => ConfigValue::Table(
                table
                    .into_iter()
                    .map(|(key, value)| (key, ConfigValue::from_toml(value)))
                    .collect(),
            ),
            Value::String(s) => match parse_theme_reference(&s) {
                Some(path) => ConfigValue::Deferred(Deferred::reference(path)),
                None => ConfigValue::Literal(Value::String(s)),
            },
            other => ConfigValue::Literal(other),
        }
    }

    /// Returns the nested table, if this is one.
    pub fn as_table(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Looks up a direct child of a table.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_table().and_then(|table| table.get(key))
    }

    /// Short type name used in error messages.
    pub fn type_str(&self) -> &'static str {
        match self {
            ConfigValue::Literal(value) => value.type_str(),
            ConfigValue::Table(_) => "table",
            ConfigValue::Deferred(_) => "deferred function",
        }
    }

    /// Sets a value at a dot-separated path, creating intermediate tables.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidPath` if the path is empty or crosses a
    /// non-table value.
    pub fn set_path(&mut self, path: &str, value: ConfigValue) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
        let Some((last, parents)) = parts.split_last() else {
            return Err(ConfigError::InvalidPath("Empty path".to_string()));
        };

        let mut current = self;
        for (i, part) in parents.iter().enumerate() {
            current = match current {
                ConfigValue::Table(table) => table
                    .entry((*part).to_string())
                    .or_insert_with(ConfigValue::empty_table),
                other => {
                    return Err(ConfigError::InvalidPath(format!(
                        "Cannot navigate into {} at path '{}'",
                        other.type_str(),
                        parts[..i].join(".")
                    )));
                }
            };
        }

        match current {
            ConfigValue::Table(table) => {
                table.insert((*last).to_string(), value);
                Ok(())
            }
            other => Err(ConfigError::InvalidPath(format!(
                "Cannot insert into {} at path '{}'",
                other.type_str(),
                parents.join(".")
            ))),
        }
    }

    /// Builder form of [`ConfigValue::set_path`].
    ///
    /// # Errors
    /// Same as [`ConfigValue::set_path`].
    pub fn with_path(mut self, path: &str, value: ConfigValue) -> Result<Self, ConfigError> {
        self.set_path(path, value)?;
        Ok(self)
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        ConfigValue::from_toml(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Literal(Value::String(value.to_string()))
    }
}

impl From<Deferred> for ConfigValue {
    fn from(value: Deferred) -> Self {
        ConfigValue::Deferred(value)
    }
}

fn parse_theme_reference(s: &str) -> Option<String> {
    let re = THEME_REFERENCE.as_ref()?;
    re.captures(s)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
