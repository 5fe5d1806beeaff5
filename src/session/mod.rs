//! Build sessions.
//!
//! A [`BuildSession`] ties theme inputs, source discovery, candidate
//! extraction and generation together in one of three modes:
//!
//! - [`BuildSession::build`] runs once and fails on any configuration error.
//! - [`BuildSession::watch`] rebuilds on file changes until told to stop.
//! - [`BuildSession::start_dev`] serves stylesheets to a dev server, adding
//!   entries lazily as they are requested.
//!
//! Live sessions are driven by a single task that owns all mutable state and
//! runs a [`RebuildCoordinator`](crate::coordinator::RebuildCoordinator).

mod artifact;
mod build;
mod dev;
mod driver;
mod inputs;
mod watch;
mod watcher;

#[cfg(test)]
mod tests;

use std::{future::Future, path::PathBuf, sync::Arc};

use tracing::instrument;

pub use artifact::{BuildArtifact, Diagnostic, Severity};
pub use build::BuildReport;
pub use dev::DevServer;
pub use inputs::SessionOptions;
pub use watcher::{FileEvent, FileEventKind};

use crate::{
    candidates::{CandidateSnapshot, ClassTokenizer, Extractor},
    core::WindsmithError,
    generator::{Generator, ThemeManifestGenerator},
};

/// Entry point for compiling a root stylesheet.
#[derive(Clone)]
pub struct BuildSession {
    options: SessionOptions,
    generator: Arc<dyn Generator>,
    extractor: Arc<dyn Extractor>,
}

impl BuildSession {
    /// Creates a session with the default tokenizer and generator.
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            generator: Arc::new(ThemeManifestGenerator),
            extractor: Arc::new(ClassTokenizer),
        }
    }

    /// Replaces the stylesheet generator.
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replaces the candidate extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Session options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Compiles the stylesheet once and writes it to the output.
    ///
    /// # Errors
    /// Any configuration, theme, generation or output error aborts the build.
    /// Unreadable source files are reported in [`BuildReport::diagnostics`].
    pub async fn build(&self) -> Result<BuildReport, WindsmithError> {
        let options = self.options.resolve()?;
        build::run(
            &options,
            Arc::clone(&self.generator),
            Arc::clone(&self.extractor),
        )
        .await
    }

    /// Scans the project and returns its candidates and scanned files.
    ///
    /// # Errors
    /// Returns an error if the theme inputs cannot be loaded.
    pub async fn candidates(&self) -> Result<(CandidateSnapshot, Vec<PathBuf>), WindsmithError> {
        let options = self.options.resolve()?;
        build::candidates(&options, Arc::clone(&self.extractor)).await
    }

    /// Watches the project and rebuilds until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error if the paths cannot be resolved or the file watcher
    /// cannot be created. Errors after startup become diagnostics.
    #[instrument(skip_all)]
    pub async fn watch(
        &self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), WindsmithError> {
        let options = self.options.resolve()?;
        watch::run(
            options,
            Arc::clone(&self.generator),
            Arc::clone(&self.extractor),
            shutdown,
        )
        .await
    }

    /// Starts a dev server session on the current tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the input or root cannot be resolved.
    pub fn start_dev(&self) -> Result<DevServer, WindsmithError> {
        let options = self.options.resolve()?;
        Ok(DevServer::start(
            options,
            Arc::clone(&self.generator),
            Arc::clone(&self.extractor),
        ))
    }
}
