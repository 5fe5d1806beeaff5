use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
};

use toml::{Table, Value};
use tracing::{debug, instrument};

use super::{
    ThemeStore, merge,
    namespace::{is_aliased_namespace, namespace_for_segment, theme_key_for_namespace},
    path_ops::{navigate, split_path},
};
use crate::config::{ConfigError, ConfigLayer, ConfigValue, EXTEND_KEY, LayerStack};

/// A fully materialized theme: nested values only, no deferred functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTheme {
    theme: Table,
}

impl ResolvedTheme {
    /// The theme as a table keyed by top-level theme key.
    pub fn as_table(&self) -> &Table {
        &self.theme
    }

    /// Looks up a dot-separated path such as `colors.red.500`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path).ok()?;
        let (first, rest) = segments.split_first()?;
        navigate(self.theme.get(first)?, rest)
    }

    /// Top-level theme keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.theme.keys().map(String::as_str)
    }

    /// Consumes the theme into a TOML value.
    pub fn into_value(self) -> Value {
        Value::Table(self.theme)
    }
}

/// Resolves the theme store and config layers into one theme.
///
/// For every theme key, layers are walked in order: `theme.<key>` replaces the
/// running value and `theme.extend.<key>` deep-merges into it, replace before
/// extend within a layer. Deferred values are evaluated on demand through a
/// [`ThemeAccessor`], memoized per call. Store tokens are bridged into the
/// theme under their aliased key, with layer entries winning on collisions.
///
/// # Errors
/// * `ConfigError::MalformedLayer` - If a layer or its theme section is not a mapping
/// * `ConfigError::CircularReference` - If deferred values reference each other in a cycle
/// * Any error returned by a deferred function
#[instrument(skip_all, fields(tokens = store.len(), layers = layers.len()))]
pub fn resolve_theme(store: &ThemeStore, layers: &LayerStack) -> Result<ResolvedTheme, ConfigError> {
    let resolution = Resolution::new(store, layers.layers())?;

    let mut keys: BTreeSet<String> = resolution.config_keys.clone();
    keys.extend(
        store
            .namespaces()
            .into_iter()
            .map(|ns| theme_key_for_namespace(ns).to_string()),
    );

    let accessor = ThemeAccessor {
        resolution: &resolution,
    };

    let mut theme = Table::new();
    for key in keys {
        if let Some(value) = accessor.lookup(&key)? {
            theme.insert(key, value);
        }
    }

    debug!(keys = theme.len(), "Resolved theme");
    Ok(ResolvedTheme { theme })
}

enum Slot {
    InProgress,
    Done(Option<Value>),
}

struct Resolution<'a> {
    store: &'a ThemeStore,
    layers: Vec<&'a BTreeMap<String, ConfigValue>>,
    config_keys: BTreeSet<String>,
    memo: RefCell<HashMap<String, Slot>>,
    chain: RefCell<Vec<String>>,
}

impl<'a> Resolution<'a> {
    fn new(store: &'a ThemeStore, layers: &'a [ConfigLayer]) -> Result<Self, ConfigError> {
        let mut sections = Vec::with_capacity(layers.len());
        let mut config_keys = BTreeSet::new();

        for (index, layer) in layers.iter().enumerate() {
            let Some(section) = layer.theme_section(index)? else {
                continue;
            };

            config_keys.extend(section.keys().filter(|k| *k != EXTEND_KEY).cloned());
            if let Some(extend) = section.get(EXTEND_KEY).and_then(ConfigValue::as_table) {
                config_keys.extend(extend.keys().cloned());
            }
            sections.push(section);
        }

        Ok(Self {
            store,
            layers: sections,
            config_keys,
            memo: RefCell::new(HashMap::new()),
            chain: RefCell::new(Vec::new()),
        })
    }

    fn is_in_progress(&self, key: &str) -> bool {
        matches!(self.memo.borrow().get(key), Some(Slot::InProgress))
    }
}

/// Read access to the theme while it is being resolved.
///
/// Handed to every deferred value. Lookups resolve the requested key on
/// demand, whichever layer defines it, and are memoized for the rest of the
/// resolution pass.
pub struct ThemeAccessor<'a> {
    resolution: &'a Resolution<'a>,
}

impl ThemeAccessor<'_> {
    /// Resolves a theme path such as `colors`, `colors.red` or `color.red`.
    ///
    /// The first segment may be a theme key (`colors`) or a raw CSS namespace
    /// (`color`); both see the store tokens of that namespace. Returns
    /// `Ok(None)` when nothing is defined at the path.
    ///
    /// # Errors
    /// * `ConfigError::InvalidPath` - If the path is malformed
    /// * `ConfigError::CircularReference` - If the key is already being resolved
    pub fn get(&self, path: &str) -> Result<Option<Value>, ConfigError> {
        let segments = split_path(path)?;
        let Some((first, rest)) = segments.split_first() else {
            return Ok(None);
        };

        let Some(value) = self.lookup(first)? else {
            return Ok(None);
        };

        Ok(navigate(&value, rest).cloned())
    }

    /// Like [`ThemeAccessor::get`], but yields an empty table when the path is
    /// missing or not a table. Convenient for spreading one key into another.
    ///
    /// # Errors
    /// Same as [`ThemeAccessor::get`].
    pub fn table(&self, path: &str) -> Result<Table, ConfigError> {
        Ok(match self.get(path)? {
            Some(Value::Table(table)) => table,
            _ => Table::new(),
        })
    }

    fn lookup(&self, segment: &str) -> Result<Option<Value>, ConfigError> {
        let resolution = self.resolution;
        let namespace = namespace_for_segment(segment);
        let store_part = resolution.store.namespace(namespace).map(Value::Table);

        let config_key = if resolution.config_keys.contains(segment) {
            Some(segment)
        } else if is_aliased_namespace(segment) {
            let key = theme_key_for_namespace(segment);
            // A raw namespace read from inside its own key only sees the store.
            (resolution.config_keys.contains(key) && !resolution.is_in_progress(key))
                .then_some(key)
        } else {
            None
        };

        let config_part = match config_key {
            Some(key) => self.resolve_key(key)?,
            None => None,
        };

        Ok(match (store_part, config_part) {
            (Some(store), Some(config)) => Some(merge::deep_merge(store, config)),
            (store, config) => config.or(store),
        })
    }

    fn resolve_key(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        let resolution = self.resolution;

        match resolution.memo.borrow().get(key) {
            Some(Slot::Done(value)) => return Ok(value.clone()),
            Some(Slot::InProgress) => {
                let mut chain = resolution.chain.borrow().clone();
                chain.push(key.to_string());
                return Err(ConfigError::CircularReference { chain });
            }
            None => {}
        }

        resolution
            .memo
            .borrow_mut()
            .insert(key.to_string(), Slot::InProgress);
        resolution.chain.borrow_mut().push(key.to_string());

        let result = self.merge_layers(key);

        resolution.chain.borrow_mut().pop();
        match &result {
            Ok(value) => {
                resolution
                    .memo
                    .borrow_mut()
                    .insert(key.to_string(), Slot::Done(value.clone()));
            }
            Err(_) => {
                resolution.memo.borrow_mut().remove(key);
            }
        }

        result
    }

    fn merge_layers(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        let mut running: Option<Value> = None;

        for section in &self.resolution.layers {
            if let Some(value) = section.get(key) {
                running = Some(self.materialize(value)?);
            }

            let extension = section
                .get(EXTEND_KEY)
                .and_then(|extend| extend.get(key));
            if let Some(value) = extension {
                let value = self.materialize(value)?;
                running = Some(merge::extend(running, value));
            }
        }

        Ok(running)
    }

    fn materialize(&self, value: &ConfigValue) -> Result<Value, ConfigError> {
        match value {
            ConfigValue::Literal(value) => Ok(value.clone()),
            ConfigValue::Table(table) => {
                let mut materialized = Table::new();
                for (child_key, child) in table {
                    materialized.insert(child_key.clone(), self.materialize(child)?);
                }
                Ok(Value::Table(materialized))
            }
            ConfigValue::Deferred(deferred) => deferred.call(self),
        }
    }
}
