use std::{
    env,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use crate::{
    candidates::CandidateSnapshot,
    config::LayerStack,
    core::WindsmithError,
    generator::Generator,
    input::RootStylesheet,
    sources::{SourceMatcher, SourceRegistry, normalize},
    theme::{ResolvedTheme, resolve_theme},
};

use super::BuildArtifact;

/// Where a session reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Root stylesheet
    pub input: PathBuf,
    /// File the stylesheet is written to; stdout when absent
    pub output: Option<PathBuf>,
    /// Project directory scanned for default sources; the working directory when absent
    pub root: Option<PathBuf>,
}

impl SessionOptions {
    /// Options for compiling `input`.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            root: None,
        }
    }

    /// Sets the output file.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Sets the project root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Makes every path absolute. The input and root must exist.
    pub(crate) fn resolve(&self) -> Result<ResolvedOptions, WindsmithError> {
        let cwd = env::current_dir()?;
        let absolute = |path: &Path| normalize(&cwd.join(path));

        let root = match &self.root {
            Some(root) => absolute(root),
            None => cwd.clone(),
        };
        let root = canonical(&root)?;
        let input = canonical(&absolute(&self.input))?;
        let output = self.output.as_deref().map(absolute);

        Ok(ResolvedOptions {
            input,
            output,
            root,
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf, WindsmithError> {
    path.canonicalize().map_err(|err| {
        WindsmithError::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {err}", path.display()),
        ))
    })
}

/// [`SessionOptions`] with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub root: PathBuf,
}

/// Everything read from the theme inputs of a session.
#[derive(Debug, Clone)]
pub(crate) struct SessionInputs {
    pub stylesheet: RootStylesheet,
    pub layers: LayerStack,
    pub registry: SourceRegistry,
    pub matcher: SourceMatcher,
    pub theme_files: Vec<PathBuf>,
}

impl SessionInputs {
    /// Reads the root stylesheet, its config files and presets, and builds
    /// the source registry they describe.
    #[instrument(skip_all, fields(input = %options.input.display()))]
    pub fn load(options: &ResolvedOptions) -> Result<Self, WindsmithError> {
        let stylesheet = RootStylesheet::read(&options.input)?;
        let layers = LayerStack::load_files(stylesheet.configs())?;

        let mut registry = SourceRegistry::for_project(&options.root);
        registry.extend_from_stylesheet(&stylesheet);
        registry.extend_from_layers(&layers);
        if let Some(output) = &options.output
            && let (Some(parent), Some(name)) = (output.parent(), output.file_name())
        {
            registry.exclude_source(name.to_string_lossy(), parent);
        }
        let matcher = registry.matcher()?;

        let mut theme_files = vec![options.input.clone()];
        theme_files.extend(stylesheet.local_imports().map(Path::to_path_buf));
        theme_files.extend(layers.origins());

        debug!(
            is_root = stylesheet.is_root(),
            layers = layers.len(),
            sources = registry.entries().len(),
            "Loaded session inputs"
        );

        Ok(Self {
            stylesheet,
            layers,
            registry,
            matcher,
            theme_files,
        })
    }

    /// Whether `path` defines the theme.
    pub fn is_theme_file(&self, path: &Path) -> bool {
        self.theme_files.iter().any(|file| file == path)
    }

    /// Resolves the theme from the stylesheet tokens and config layers.
    pub fn resolve_theme(&self) -> Result<ResolvedTheme, WindsmithError> {
        Ok(resolve_theme(self.stylesheet.theme(), &self.layers)?)
    }
}

/// Produces the artifact for the current inputs.
///
/// A stylesheet that is not a compilation root is passed through verbatim.
/// Otherwise the output is the imports that were not inlined, then the
/// generated rules, then the remaining stylesheet body.
pub(crate) fn render(
    stylesheet: &RootStylesheet,
    theme: &ResolvedTheme,
    candidates: &CandidateSnapshot,
    generator: &dyn Generator,
    theme_revision: u64,
) -> Result<BuildArtifact, WindsmithError> {
    if !stylesheet.is_root() {
        return Ok(BuildArtifact::passthrough(
            stylesheet.raw().to_string(),
            theme_revision,
            candidates.revision(),
        ));
    }

    let mut css = String::new();
    for statement in stylesheet.import_statements() {
        css.push_str(statement);
        css.push('\n');
    }
    css.push_str(&generator.generate(theme, candidates)?);
    if !stylesheet.body().is_empty() {
        if !css.is_empty() && !css.ends_with('\n') {
            css.push('\n');
        }
        css.push_str(stylesheet.body());
        css.push('\n');
    }

    Ok(BuildArtifact::generated(css, theme_revision, candidates.revision()))
}
