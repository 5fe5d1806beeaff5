mod circular_detection;

use std::{
    fs,
    path::{Path, PathBuf},
};

use circular_detection::CircularDetector;
use toml::Value;
use tracing::{debug, instrument};

use super::{ConfigError, ConfigLayer, LayerStack};

impl LayerStack {
    /// Loads a config file and its presets as an ordered list of layers.
    ///
    /// Presets listed under `presets` are resolved relative to the declaring
    /// file and loaded depth-first before it, so the file itself always takes
    /// precedence over its presets. Every layer's base is the directory of the
    /// file it came from.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file or any preset cannot be read
    /// - The TOML content is invalid
    /// - Presets import each other
    #[instrument]
    pub fn load_file(path: &Path) -> Result<LayerStack, ConfigError> {
        let canonical_path = path.canonicalize().map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            details: format!("Failed to resolve path: {e}"),
        })?;

        let mut detector = CircularDetector::new();
        let mut stack = LayerStack::new();
        Self::load_with_tracking(&canonical_path, &mut detector, &mut stack)?;

        debug!(layers = stack.len(), "Loaded config layers");
        Ok(stack)
    }

    /// Loads several config files in order into one stack.
    ///
    /// # Errors
    /// Returns the first error from [`LayerStack::load_file`].
    pub fn load_files(paths: &[PathBuf]) -> Result<LayerStack, ConfigError> {
        let mut stack = LayerStack::new();
        for path in paths {
            stack.extend(Self::load_file(path)?.layers().iter().cloned());
        }
        Ok(stack)
    }

    fn load_with_tracking(
        path: &Path,
        detector: &mut CircularDetector,
        stack: &mut LayerStack,
    ) -> Result<(), ConfigError> {
        detector.detect_circular_import(path)?;
        detector.push_to_chain(path);

        let result = Self::load_layer_with_presets(path, detector, stack);
        detector.pop_from_chain();
        result
    }

    fn load_layer_with_presets(
        path: &Path,
        detector: &mut CircularDetector,
        stack: &mut LayerStack,
    ) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::import(e, path))?;
        let value: Value =
            toml::from_str(&content).map_err(|e| ConfigError::toml_parse(e, Some(path)))?;

        let base = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::Import {
                path: path.to_path_buf(),
                details: "Invalid base path - no parent directory".to_string(),
            })?;

        let layer = ConfigLayer::from_toml(value, &base).with_origin(path);

        for preset in layer.presets() {
            let resolved = Self::resolve_preset_path(path, &preset)?;
            let canonical = resolved
                .canonicalize()
                .map_err(|e| ConfigError::import(e, &resolved))?;

            Self::load_with_tracking(&canonical, detector, stack)?;
        }

        stack.push(layer);
        Ok(())
    }

    fn resolve_preset_path(base_path: &Path, preset: &str) -> Result<PathBuf, ConfigError> {
        let parent_dir = base_path.parent().ok_or_else(|| ConfigError::Import {
            path: base_path.to_path_buf(),
            details: "Invalid base path - no parent directory".to_string(),
        })?;

        let mut preset_path = PathBuf::from(preset);
        if preset_path.extension().is_none() {
            preset_path.set_extension("toml");
        }

        Ok(parent_dir.join(preset_path))
    }
}
