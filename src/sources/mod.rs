//! The set of files a session treats as sources.
//!
//! [`SourceRegistry`] is declarative: it records glob entries and never
//! touches the filesystem. [`SourceRegistry::matcher`] compiles it into a
//! [`SourceMatcher`] that answers "is this path a source?", and
//! [`SourceMatcher::scan`] walks the registered roots.

mod filters;
mod glob;
mod scan;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use globset::GlobSet;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

use crate::{config::LayerStack, core::WindsmithError, input::RootStylesheet};
pub(crate) use glob::normalize;

/// Where a source entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// Automatic project-wide detection
    Default,
    /// `@source` or a config `content` glob
    Declared,
    /// `@source not` or a `!`-prefixed content glob
    Negated,
}

/// One glob registered with the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceEntry {
    /// Pattern as declared
    pub pattern: String,
    /// Directory the pattern is relative to
    pub base: PathBuf,
    /// How the entry was registered
    pub origin: SourceOrigin,
}

impl SourceEntry {
    /// The entry as an absolute glob.
    pub fn glob(&self) -> String {
        glob::absolute_glob(&self.base, &self.pattern)
    }
}

/// Default sources plus declared ones, minus exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose default source is everything under `root`.
    pub fn for_project(root: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.insert(SourceEntry {
            pattern: "**/*".to_string(),
            base: root.into(),
            origin: SourceOrigin::Default,
        });
        registry
    }

    /// Registers a declared source.
    pub fn add_source(&mut self, pattern: impl Into<String>, base: impl Into<PathBuf>) {
        self.insert(SourceEntry {
            pattern: pattern.into(),
            base: base.into(),
            origin: SourceOrigin::Declared,
        });
    }

    /// Registers an exclusion. Exclusions win over every other entry.
    pub fn exclude_source(&mut self, pattern: impl Into<String>, base: impl Into<PathBuf>) {
        self.insert(SourceEntry {
            pattern: pattern.into(),
            base: base.into(),
            origin: SourceOrigin::Negated,
        });
    }

    /// Adds the `@source` directives of a root stylesheet.
    pub fn extend_from_stylesheet(&mut self, stylesheet: &RootStylesheet) {
        for directive in stylesheet.sources() {
            if directive.negated {
                self.exclude_source(directive.pattern.clone(), directive.base.clone());
            } else {
                self.add_source(directive.pattern.clone(), directive.base.clone());
            }
        }
    }

    /// Adds the `content` globs of every config layer.
    pub fn extend_from_layers(&mut self, layers: &LayerStack) {
        for content in layers.content_globs() {
            if content.negated {
                self.exclude_source(content.pattern, content.base);
            } else {
                self.add_source(content.pattern, content.base);
            }
        }
    }

    fn insert(&mut self, entry: SourceEntry) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    /// Included entries, de-duplicated, without those an exclusion names exactly.
    pub fn sources(&self) -> Vec<&SourceEntry> {
        let excluded: Vec<String> = self.exclusions().map(SourceEntry::glob).collect();
        let mut seen: Vec<String> = Vec::new();

        self.entries
            .iter()
            .filter(|entry| entry.origin != SourceOrigin::Negated)
            .filter(|entry| {
                let glob = entry.glob();
                if excluded.contains(&glob) || seen.contains(&glob) {
                    return false;
                }
                seen.push(glob);
                true
            })
            .collect()
    }

    /// Entries registered as exclusions.
    pub fn exclusions(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.origin == SourceOrigin::Negated)
    }

    /// Every entry in registration order.
    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Directories that must be walked or watched to see every source.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for entry in self.sources() {
            let root = glob::static_root(&entry.glob());
            if roots.iter().any(|existing| root.starts_with(existing)) {
                continue;
            }
            roots.retain(|existing| !existing.starts_with(&root));
            roots.push(root);
        }
        roots
    }

    /// Compiles the registry into a matcher.
    ///
    /// # Errors
    /// Returns `WindsmithError::InvalidGlob` if any pattern is not a valid glob.
    pub fn matcher(&self) -> Result<SourceMatcher, WindsmithError> {
        let globs_for = |origin: SourceOrigin| -> Vec<String> {
            self.entries
                .iter()
                .filter(|entry| entry.origin == origin)
                .map(SourceEntry::glob)
                .collect()
        };

        let defaults = globs_for(SourceOrigin::Default);
        let declared = globs_for(SourceOrigin::Declared);
        let excluded = globs_for(SourceOrigin::Negated);

        let default_bases: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|entry| entry.origin == SourceOrigin::Default)
            .map(|entry| entry.base.clone())
            .collect();

        let mut walks: Vec<(PathBuf, bool)> = Vec::new();
        for entry in self.sources() {
            let walk = (
                glob::static_root(&entry.glob()),
                entry.origin == SourceOrigin::Default,
            );
            if !walks.contains(&walk) {
                walks.push(walk);
            }
        }

        let matcher = SourceMatcher {
            defaults: glob::build_globset(defaults.iter().map(String::as_str))?,
            declared: glob::build_globset(declared.iter().map(String::as_str))?,
            excluded: glob::build_globset(excluded.iter().map(String::as_str))?,
            gitignores: default_bases.iter().filter_map(|base| load_gitignore(base)).collect(),
            walks,
            roots: self.roots(),
        };

        debug!(
            defaults = defaults.len(),
            declared = declared.len(),
            excluded = excluded.len(),
            "Compiled source matcher"
        );
        Ok(matcher)
    }
}

fn load_gitignore(base: &Path) -> Option<Gitignore> {
    let path = base.join(".gitignore");
    if !path.is_file() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(base);
    if let Some(err) = builder.add(&path) {
        warn!(path = %path.display(), error = %err, "Partially invalid .gitignore");
    }
    match builder.build() {
        Ok(gitignore) => Some(gitignore),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable .gitignore");
            None
        }
    }
}

/// A compiled [`SourceRegistry`].
#[derive(Debug, Clone)]
pub struct SourceMatcher {
    defaults: GlobSet,
    declared: GlobSet,
    excluded: GlobSet,
    gitignores: Vec<Gitignore>,
    walks: Vec<(PathBuf, bool)>,
    roots: Vec<PathBuf>,
}

impl SourceMatcher {
    /// Whether `path` is a source file.
    ///
    /// Exclusions always win. Declared sources skip only binary files;
    /// default sources also skip ignored, dependency, lock and style files.
    pub fn is_source(&self, path: &Path) -> bool {
        let path = normalize(path);

        if self.excluded.is_match(&path) {
            return false;
        }
        if self.declared.is_match(&path) {
            return !filters::skip_declared(&path);
        }
        if self.defaults.is_match(&path) {
            return !filters::skip_default(&path) && !self.is_gitignored(&path);
        }
        false
    }

    /// Whether `path` is matched by an explicitly declared source.
    pub fn is_declared_source(&self, path: &Path) -> bool {
        let path = normalize(path);
        !self.excluded.is_match(&path)
            && self.declared.is_match(&path)
            && !filters::skip_declared(&path)
    }

    fn is_gitignored(&self, path: &Path) -> bool {
        self.gitignores.iter().any(|gitignore| {
            path.starts_with(gitignore.path())
                && gitignore
                    .matched_path_or_any_parents(path, false)
                    .is_ignore()
        })
    }

    /// Directories that must be walked or watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}
