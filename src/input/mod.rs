//! Root stylesheet parsing.
//!
//! A root stylesheet is the CSS entry file a session compiles. It is only a
//! compilation root while it imports the engine; everything else about it is
//! read lexically: `@theme` blocks feed the [`ThemeStore`], `@source` and
//! `@config` lines declare sources and config files, and whatever CSS is left
//! is passed through after the generated rules.
//!
//! Local `@import`s are inlined when the stylesheet is read from disk, so an
//! imported file's tokens, directives and rules count as the root's own.
//! Remote imports, and local ones that cannot be read, are kept as written
//! and emitted ahead of the generated rules.

mod directives;

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::{core::WindsmithError, sources::normalize, theme::ThemeStore};
use directives::LineDirective;

/// Whether `css` is a compilation root.
///
/// True when the stylesheet imports the engine, either whole
/// (`@import "windsmith"`) or in part (`@import "windsmith/utilities"`).
/// Commented-out imports do not count. Pure; re-evaluate it on every change
/// to the file.
pub fn is_compilation_root(css: &str) -> bool {
    directives::imports_engine(css)
}

/// A source glob declared with `@source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirective {
    /// Glob pattern, relative to [`Self::base`]
    pub pattern: String,
    /// Declared with `@source not`
    pub negated: bool,
    /// Directory of the stylesheet that declared it
    pub base: PathBuf,
}

/// An `@import` other than the engine's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetImport {
    /// The statement as written, including its `;`
    pub statement: String,
    /// The imported file, when the target is a local path
    pub path: Option<PathBuf>,
    /// Whether the file was merged into the importing stylesheet
    pub inlined: bool,
}

/// Everything the engine reads from a root stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RootStylesheet {
    path: PathBuf,
    is_root: bool,
    theme: ThemeStore,
    declarations: Vec<(String, String)>,
    sources: Vec<SourceDirective>,
    configs: Vec<PathBuf>,
    imports: Vec<StylesheetImport>,
    body: String,
    raw: String,
}

impl RootStylesheet {
    /// Parses the stylesheet at `path` from already-loaded content.
    ///
    /// Imports are recorded but not followed; see [`Self::read`].
    pub fn parse(path: impl Into<PathBuf>, css: &str) -> Self {
        let path = path.into();
        let is_root = is_compilation_root(css);

        let mut declarations = Vec::new();
        let mut body = String::with_capacity(css.len());
        let mut cursor = 0usize;

        for block in directives::theme_blocks(css) {
            for (name, value) in directives::declarations(block.body) {
                declarations.push((name.to_string(), value.to_string()));
            }
            body.push_str(&css[cursor..block.start]);
            cursor = block.end;
        }
        body.push_str(&css[cursor..]);
        let body = directives::without_comments(&body);

        let base = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let mut sources = Vec::new();
        let mut configs = Vec::new();
        let mut imports = Vec::new();
        let mut remaining = String::with_capacity(body.len());

        for line in body.lines() {
            let mut kept = String::new();
            let mut consumed = false;

            for statement in directives::statements(line) {
                match directives::line_directive(statement) {
                    Some(LineDirective::EngineImport) => {}
                    Some(LineDirective::Import { target, statement }) => {
                        let path = directives::is_local_target(&target)
                            .then(|| normalize(&base.join(&target)));
                        imports.push(StylesheetImport {
                            statement,
                            path,
                            inlined: false,
                        });
                    }
                    Some(LineDirective::Source { pattern, negated }) => {
                        sources.push(SourceDirective {
                            pattern,
                            negated,
                            base: base.clone(),
                        });
                    }
                    Some(LineDirective::Config(config)) => configs.push(base.join(config)),
                    None => {
                        kept.push_str(statement);
                        continue;
                    }
                }
                consumed = true;
            }

            let kept = if consumed { kept.trim() } else { line };
            if !kept.is_empty() || !consumed {
                remaining.push_str(kept);
                remaining.push('\n');
            }
        }

        Self {
            path,
            is_root,
            theme: declarations.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect(),
            declarations,
            sources,
            configs,
            imports,
            body: remaining.trim().to_string(),
            raw: css.to_string(),
        }
    }

    /// Reads and parses a stylesheet from disk, inlining local imports.
    ///
    /// Imported files are merged depth-first ahead of the importing file's
    /// own content. An import cycle is broken at the repeated file. A local
    /// import that cannot be read is kept as a plain `@import`.
    ///
    /// # Errors
    /// Returns `WindsmithError::Io` if the root file cannot be read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self, WindsmithError> {
        let path = path.as_ref();
        let css = std::fs::read_to_string(path)?;
        let mut stylesheet = Self::parse(path, &css);
        stylesheet.inline_imports(&mut vec![normalize(path)]);
        debug!(
            is_root = stylesheet.is_root,
            tokens = stylesheet.theme.len(),
            sources = stylesheet.sources.len(),
            configs = stylesheet.configs.len(),
            imports = stylesheet.imports.len(),
            "Parsed root stylesheet"
        );
        Ok(stylesheet)
    }

    fn inline_imports(&mut self, chain: &mut Vec<PathBuf>) {
        let mut declarations = Vec::new();
        let mut sources = Vec::new();
        let mut configs = Vec::new();
        let mut bodies = Vec::new();
        let mut imports = Vec::new();

        for mut import in std::mem::take(&mut self.imports) {
            let Some(path) = import.path.clone() else {
                imports.push(import);
                continue;
            };

            if chain.contains(&path) {
                warn!(path = %path.display(), "Import cycle, skipping repeated stylesheet");
                import.inlined = true;
                imports.push(import);
                continue;
            }

            let css = match std::fs::read_to_string(&path) {
                Ok(css) => css,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "Keeping unreadable import as written");
                    imports.push(import);
                    continue;
                }
            };

            let mut child = Self::parse(&path, &css);
            chain.push(path);
            child.inline_imports(chain);
            chain.pop();

            declarations.append(&mut child.declarations);
            sources.append(&mut child.sources);
            configs.append(&mut child.configs);
            if !child.body.is_empty() {
                bodies.push(child.body);
            }
            imports.append(&mut child.imports);
            import.inlined = true;
            imports.push(import);
        }

        declarations.append(&mut self.declarations);
        sources.append(&mut self.sources);
        configs.append(&mut self.configs);
        if !self.body.is_empty() {
            bodies.push(std::mem::take(&mut self.body));
        }

        self.theme = declarations.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
        self.declarations = declarations;
        self.sources = sources;
        self.configs = configs;
        self.imports = imports;
        self.body = bodies.join("\n");
    }

    /// Path of the stylesheet.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative directives resolve against.
    pub fn base(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Whether the file currently imports the engine.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Tokens declared in `@theme` blocks, in declaration order.
    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    /// Globs declared with `@source` and `@source not`.
    pub fn sources(&self) -> &[SourceDirective] {
        &self.sources
    }

    /// Config files referenced with `@config`, resolved against the
    /// directory of the stylesheet that declared them.
    pub fn configs(&self) -> &[PathBuf] {
        &self.configs
    }

    /// Every non-engine `@import`, nested ones included, in source order.
    pub fn imports(&self) -> &[StylesheetImport] {
        &self.imports
    }

    /// `@import` statements that were not inlined and must lead the output.
    pub fn import_statements(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|import| !import.inlined)
            .map(|import| import.statement.as_str())
    }

    /// Local files this stylesheet imports, whether or not they could be read.
    pub fn local_imports(&self) -> impl Iterator<Item = &Path> {
        self.imports.iter().filter_map(|import| import.path.as_deref())
    }

    /// CSS left once engine directives and imports are removed.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The file content exactly as read.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
