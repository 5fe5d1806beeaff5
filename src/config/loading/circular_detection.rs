use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Tracks the preset chain for circular detection
pub(super) struct CircularDetector {
    import_chain: Vec<PathBuf>,
}

impl CircularDetector {
    pub fn new() -> Self {
        Self {
            import_chain: Vec::new(),
        }
    }

    /// Returns an error if visiting `path` would close a cycle
    pub fn detect_circular_import(&self, path: &Path) -> Result<(), ConfigError> {
        if self.import_chain.iter().any(|p| p == path) {
            let mut chain: Vec<String> = self.import_chain.iter().map(|p| display_name(p)).collect();
            chain.push(display_name(path));

            return Err(ConfigError::CircularImport { chain });
        }
        Ok(())
    }

    pub fn push_to_chain(&mut self, path: &Path) {
        self.import_chain.push(path.to_path_buf());
    }

    pub fn pop_from_chain(&mut self) {
        self.import_chain.pop();
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}
