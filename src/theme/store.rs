use indexmap::IndexMap;
use toml::{Table, Value};

use super::namespace::{insert_nested, key_path, split_variable};

const INITIAL: &str = "initial";

/// Ordered, flat store of design tokens keyed by custom-property name.
///
/// Keys look like `--color-red-500`. Re-adding a key updates its value in
/// place without moving it. `--color-*: initial` removes every token in the
/// `color` namespace and `--*: initial` empties the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeStore {
    entries: IndexMap<String, String>,
}

impl ThemeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a token, honoring namespace resets.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if value.trim() == INITIAL {
            if name == "--*" {
                self.entries.clear();
                return;
            }
            if let Some(namespace) = name
                .strip_suffix("-*")
                .and_then(|n| n.strip_prefix("--"))
            {
                self.clear_namespace(namespace);
                return;
            }
        }

        self.entries.insert(name, value);
    }

    /// Removes every token belonging to `namespace`.
    pub fn clear_namespace(&mut self, namespace: &str) {
        self.entries
            .retain(|key, _| split_variable(key).is_none_or(|(ns, _)| ns != namespace));
    }

    /// Looks up a token by its exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Tokens in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct namespaces in order of first appearance.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = Vec::new();
        for (namespace, _) in self.entries.keys().filter_map(|k| split_variable(k)) {
            if !namespaces.contains(&namespace) {
                namespaces.push(namespace);
            }
        }
        namespaces
    }

    /// Rebuilds the nested mapping for one namespace.
    ///
    /// Returns `None` when the namespace has no tokens.
    pub fn namespace(&self, namespace: &str) -> Option<Table> {
        let mut table = Table::new();
        let mut found = false;

        for (key, value) in &self.entries {
            let Some((ns, remainder)) = split_variable(key) else {
                continue;
            };
            if ns != namespace {
                continue;
            }
            found = true;
            insert_nested(&mut table, &key_path(remainder), Value::String(value.clone()));
        }

        found.then_some(table)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ThemeStore {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut store = ThemeStore::new();
        for (name, value) in iter {
            store.add(name, value);
        }
        store
    }
}
