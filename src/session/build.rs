use std::{path::PathBuf, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    candidates::{CandidateSet, CandidateSnapshot, Extractor, extract_candidates},
    core::{BuildMode, WindsmithError},
    generator::Generator,
    theme::ResolvedTheme,
};

use super::{
    BuildArtifact, Diagnostic,
    inputs::{ResolvedOptions, SessionInputs, render},
};

/// Result of a one-shot build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The generated stylesheet
    pub artifact: BuildArtifact,
    /// Non-fatal problems, such as unreadable source files
    pub diagnostics: Vec<Diagnostic>,
    /// Number of source files scanned
    pub files: usize,
}

/// Loads the inputs, scans every source and merges their candidates.
pub(crate) async fn collect(
    options: &ResolvedOptions,
    extractor: Arc<dyn Extractor>,
) -> Result<(SessionInputs, CandidateSet, Vec<Diagnostic>, usize), WindsmithError> {
    let loaded = {
        let options = options.clone();
        tokio::task::spawn_blocking(move || {
            let inputs = SessionInputs::load(&options)?;
            let files = inputs.matcher.scan();
            Ok::<_, WindsmithError>((inputs, files))
        })
        .await
        .map_err(|err| WindsmithError::Generation {
            details: format!("background task failed: {err}"),
        })??
    };
    let (inputs, files) = loaded;

    let extraction = extract_candidates(&files, extractor).await;
    let diagnostics = extraction
        .failures
        .iter()
        .map(|err| {
            if err.is_fatal_for(BuildMode::Build) {
                Diagnostic::error(err)
            } else {
                Diagnostic::warning(err)
            }
        })
        .collect();

    let mut candidates = CandidateSet::new();
    candidates.merge(extraction.candidates);

    Ok((inputs, candidates, diagnostics, files.len()))
}

/// Runs a single build and writes the result.
///
/// # Errors
/// Returns an error if the inputs cannot be loaded, the theme cannot be
/// resolved, generation fails, or the output cannot be written. Unreadable
/// source files only produce diagnostics.
#[instrument(skip_all, fields(input = %options.input.display()))]
pub(crate) async fn run(
    options: &ResolvedOptions,
    generator: Arc<dyn Generator>,
    extractor: Arc<dyn Extractor>,
) -> Result<BuildReport, WindsmithError> {
    let (inputs, candidates, diagnostics, files) = collect(options, extractor).await?;
    for diagnostic in &diagnostics {
        warn!("{diagnostic}");
    }

    let theme = if inputs.stylesheet.is_root() {
        inputs.resolve_theme()?
    } else {
        ResolvedTheme::default()
    };
    let artifact = render(
        &inputs.stylesheet,
        &theme,
        &candidates.snapshot(),
        generator.as_ref(),
        0,
    )?;

    match &options.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, artifact.css()).await?;
        }
        None => println!("{}", artifact.css()),
    }

    info!(
        files,
        candidates = candidates.len(),
        bytes = artifact.css().len(),
        "Build finished"
    );

    Ok(BuildReport {
        artifact,
        diagnostics,
        files,
    })
}

/// Scans the project and returns every candidate found, without generating.
pub(crate) async fn candidates(
    options: &ResolvedOptions,
    extractor: Arc<dyn Extractor>,
) -> Result<(CandidateSnapshot, Vec<PathBuf>), WindsmithError> {
    let loaded = {
        let options = options.clone();
        tokio::task::spawn_blocking(move || {
            SessionInputs::load(&options).map(|inputs| inputs.matcher.scan())
        })
        .await
        .map_err(|err| WindsmithError::Generation {
            details: format!("background task failed: {err}"),
        })??
    };

    let extraction = extract_candidates(&loaded, Arc::clone(&extractor)).await;
    let mut set = CandidateSet::new();
    set.merge(extraction.candidates);
    Ok((set.snapshot(), loaded))
}
