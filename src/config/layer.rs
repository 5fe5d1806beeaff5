use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use toml::Value;

use super::{ConfigError, ConfigValue};

/// Reserved key holding theme overrides.
pub const THEME_KEY: &str = "theme";
/// Reserved key inside `theme` holding deep-merged additions.
pub const EXTEND_KEY: &str = "extend";
/// Reserved key holding content globs.
pub const CONTENT_KEY: &str = "content";
/// Reserved key listing preset config files.
pub const PRESETS_KEY: &str = "presets";

/// One legacy configuration contribution to theme resolution.
///
/// Immutable once built. `base` scopes relative references (content globs,
/// presets) found inside this layer's values.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    config: ConfigValue,
    base: PathBuf,
    origin: Option<PathBuf>,
}

/// A glob declared in a layer's `content` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGlob {
    /// Glob pattern with any leading `!` removed
    pub pattern: String,
    /// Whether the glob was negated with a leading `!`
    pub negated: bool,
    /// Directory the pattern is relative to
    pub base: PathBuf,
}

impl ConfigLayer {
    /// Creates a layer from an already-built config value.
    pub fn new(config: ConfigValue, base: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base: base.into(),
            origin: None,
        }
    }

    /// Creates a layer from a parsed TOML document.
    pub fn from_toml(value: Value, base: impl Into<PathBuf>) -> Self {
        Self::new(ConfigValue::from_toml(value), base)
    }

    /// Parses a TOML document into a layer.
    ///
    /// # Errors
    /// Returns `ConfigError::TomlParse` if the content is not valid TOML.
    pub fn from_toml_str(content: &str, base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let value: Value = toml::from_str(content).map_err(|e| ConfigError::toml_parse(e, None))?;
        Ok(Self::from_toml(value, base))
    }

    pub(crate) fn with_origin(mut self, origin: &Path) -> Self {
        self.origin = Some(origin.to_path_buf());
        self
    }

    /// The raw config value of this layer.
    pub fn config(&self) -> &ConfigValue {
        &self.config
    }

    /// Base path relative references are resolved against.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File this layer was loaded from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Returns the `theme` section, validating that the layer is well-formed.
    ///
    /// # Errors
    /// Returns `ConfigError::MalformedLayer` if the layer or its `theme`/`extend`
    /// sections are not mappings.
    pub fn theme_section(
        &self,
        index: usize,
    ) -> Result<Option<&BTreeMap<String, ConfigValue>>, ConfigError> {
        let malformed = |details: String| ConfigError::MalformedLayer {
            index,
            base: self.base.clone(),
            details,
        };

        let root = self.config.as_table().ok_or_else(|| {
            malformed(format!("expected a table, found {}", self.config.type_str()))
        })?;

        let Some(theme) = root.get(THEME_KEY) else {
            return Ok(None);
        };

        let theme = theme
            .as_table()
            .ok_or_else(|| malformed(format!("`theme` must be a table, found {}", theme.type_str())))?;

        if let Some(extend) = theme.get(EXTEND_KEY)
            && extend.as_table().is_none()
        {
            return Err(malformed(format!(
                "`theme.extend` must be a table, found {}",
                extend.type_str()
            )));
        }

        Ok(Some(theme))
    }

    /// Globs listed under `content`, either as an array or as `{ files = [...] }`.
    pub fn content_globs(&self) -> Vec<ContentGlob> {
        let Some(content) = self.config.get(CONTENT_KEY) else {
            return Vec::new();
        };

        let files = match content {
            ConfigValue::Literal(Value::Array(files)) => Some(files),
            ConfigValue::Table(table) => match table.get("files") {
                Some(ConfigValue::Literal(Value::Array(files))) => Some(files),
                _ => None,
            },
            _ => None,
        };

        files
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(|glob| match glob.strip_prefix('!') {
                Some(pattern) => ContentGlob {
                    pattern: pattern.to_string(),
                    negated: true,
                    base: self.base.clone(),
                },
                None => ContentGlob {
                    pattern: glob.to_string(),
                    negated: false,
                    base: self.base.clone(),
                },
            })
            .collect()
    }

    /// Relative paths listed under `presets`.
    pub fn presets(&self) -> Vec<String> {
        match self.config.get(PRESETS_KEY) {
            Some(ConfigValue::Literal(Value::Array(presets))) => presets
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The ordered list of config layers feeding theme resolution.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<ConfigLayer>,
}

impl LayerStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer; later layers take precedence.
    pub fn push(&mut self, layer: ConfigLayer) {
        self.layers.push(layer);
    }

    /// Layers in resolution order.
    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Every content glob across all layers, in layer order.
    pub fn content_globs(&self) -> Vec<ContentGlob> {
        self.layers.iter().flat_map(ConfigLayer::content_globs).collect()
    }

    /// Files the layers were loaded from, de-duplicated, in layer order.
    pub fn origins(&self) -> Vec<PathBuf> {
        let mut origins: Vec<PathBuf> = Vec::new();
        for origin in self.layers.iter().filter_map(ConfigLayer::origin) {
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_path_buf());
            }
        }
        origins
    }
}

impl FromIterator<ConfigLayer> for LayerStack {
    fn from_iter<T: IntoIterator<Item = ConfigLayer>>(iter: T) -> Self {
        Self {
            layers: iter.into_iter().collect(),
        }
    }
}

impl Extend<ConfigLayer> for LayerStack {
    fn extend<T: IntoIterator<Item = ConfigLayer>>(&mut self, iter: T) {
        self.layers.extend(iter);
    }
}
