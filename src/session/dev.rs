use std::{path::PathBuf, sync::Arc};

use futures::{Stream, StreamExt};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_stream::wrappers::WatchStream;

use crate::{
    candidates::{CandidateSnapshot, Extractor},
    core::{BuildMode, WindsmithError},
    generator::Generator,
};

use super::{
    BuildArtifact, Diagnostic, FileEvent,
    driver::{Command, Driver, Sink},
    inputs::ResolvedOptions,
};

const COMMAND_CAPACITY: usize = 100;

/// Handle to a dev server session.
///
/// Entries are registered lazily: the first request for an entry extracts its
/// candidates before the stylesheet is returned. Declared sources are
/// scanned up front; the project-wide default scan is never run. Changes are
/// fed in through [`DevServer::notify_change`] by the host's own watcher.
///
/// Dropping every clone of the handle shuts the session down.
#[derive(Clone)]
pub struct DevServer {
    command_tx: mpsc::Sender<Command>,
    artifacts: watch::Receiver<Option<Arc<BuildArtifact>>>,
    _handle: Arc<JoinHandle<()>>,
}

impl DevServer {
    pub(crate) fn start(
        options: ResolvedOptions,
        generator: Arc<dyn Generator>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (published, artifacts) = watch::channel(None);

        let driver = Driver::new(
            BuildMode::Dev,
            options,
            generator,
            extractor,
            Sink::None,
            published,
        );
        let handle = tokio::spawn(driver.run(Some(command_rx), None, std::future::pending()));

        Self {
            command_tx,
            artifacts,
            _handle: Arc::new(handle),
        }
    }

    /// Returns the stylesheet once `entry`'s candidates are included.
    ///
    /// Relative entries are resolved against the project root.
    ///
    /// # Errors
    /// Returns `WindsmithError::SessionClosed` if the session is gone, or
    /// `WindsmithError::Generation` if no stylesheet could be produced yet.
    pub async fn stylesheet(
        &self,
        entry: impl Into<PathBuf>,
    ) -> Result<Arc<BuildArtifact>, WindsmithError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Stylesheet {
            entry: entry.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| WindsmithError::SessionClosed)?
    }

    /// Reports a file change observed by the host.
    ///
    /// # Errors
    /// Returns `WindsmithError::SessionClosed` if the session is gone.
    pub async fn notify_change(&self, event: FileEvent) -> Result<(), WindsmithError> {
        self.send(Command::Change(event)).await
    }

    /// Diagnostics collected since the session started.
    ///
    /// # Errors
    /// Returns `WindsmithError::SessionClosed` if the session is gone.
    pub async fn diagnostics(&self) -> Result<Vec<Diagnostic>, WindsmithError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Diagnostics { reply }).await?;
        response.await.map_err(|_| WindsmithError::SessionClosed)
    }

    /// Snapshot of every candidate collected so far.
    ///
    /// # Errors
    /// Returns `WindsmithError::SessionClosed` if the session is gone.
    pub async fn candidates(&self) -> Result<CandidateSnapshot, WindsmithError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Candidates { reply }).await?;
        response.await.map_err(|_| WindsmithError::SessionClosed)
    }

    /// Stream of newly published stylesheets.
    ///
    /// Yields the latest artifact first, if any, then every artifact whose
    /// text differs from the previous one.
    pub fn subscribe(&self) -> impl Stream<Item = Arc<BuildArtifact>> + Send + 'static {
        WatchStream::new(self.artifacts.clone()).filter_map(|artifact| async move { artifact })
    }

    /// The most recently published stylesheet.
    pub fn latest(&self) -> Option<Arc<BuildArtifact>> {
        self.artifacts.borrow().clone()
    }

    async fn send(&self, command: Command) -> Result<(), WindsmithError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| WindsmithError::SessionClosed)
    }
}
