use std::{collections::HashSet, path::PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, instrument, warn};

use super::SourceMatcher;

impl SourceMatcher {
    /// Walks every registered root and returns the source files found.
    ///
    /// Roots of default sources honor `.gitignore` files; roots of declared
    /// sources are walked in full. Missing roots are skipped. Results are
    /// sorted and free of duplicates.
    pub fn scan(&self) -> Vec<PathBuf> {
        self.walk(false)
    }

    /// Like [`SourceMatcher::scan`], restricted to explicitly declared sources.
    pub fn scan_declared(&self) -> Vec<PathBuf> {
        self.walk(true)
    }

    #[instrument(skip(self), fields(walks = self.walks.len()))]
    fn walk(&self, declared_only: bool) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for (root, respect_vcs) in &self.walks {
            if declared_only && *respect_vcs {
                continue;
            }
            if !root.exists() {
                debug!(root = %root.display(), "Skipping missing source root");
                continue;
            }

            let mut builder = WalkBuilder::new(root);
            builder
                .hidden(false)
                .require_git(false)
                .git_ignore(*respect_vcs)
                .git_global(*respect_vcs)
                .git_exclude(*respect_vcs)
                .ignore(*respect_vcs)
                .parents(*respect_vcs);

            for entry in builder.build() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "Skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }

                let path = entry.path();
                let accepted = if declared_only {
                    self.is_declared_source(path)
                } else {
                    self.is_source(path)
                };
                if accepted && seen.insert(path.to_path_buf()) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files.sort();
        debug!(files = files.len(), "Scanned sources");
        files
    }
}
