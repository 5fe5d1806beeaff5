use std::{
    collections::HashSet,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    candidates::{CandidateSet, CandidateSnapshot, Extraction, Extractor, extract_candidates},
    coordinator::{Action, Change, ExtractionWork, RebuildCoordinator},
    core::{BuildMode, WindsmithError},
    generator::Generator,
    sources::{SourceRegistry, normalize},
    theme::ResolvedTheme,
};

use super::{
    BuildArtifact, Diagnostic, FileEvent,
    inputs::{ResolvedOptions, SessionInputs, render},
    watcher::FileWatcher,
};

const MAX_DIAGNOSTICS: usize = 256;

type Reply<T> = oneshot::Sender<T>;

/// Requests handled by a running session.
pub(crate) enum Command {
    /// Stylesheet for a dev entry, answered once the entry is merged and the cycle settles
    Stylesheet {
        entry: PathBuf,
        reply: Reply<Result<Arc<BuildArtifact>, WindsmithError>>,
    },
    /// A change observed by an external watcher
    Change(FileEvent),
    /// Diagnostics collected so far
    Diagnostics { reply: Reply<Vec<Diagnostic>> },
    /// Snapshot of the candidate set
    Candidates { reply: Reply<CandidateSnapshot> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseKind {
    Extraction,
    Generation,
}

enum PhaseOutcome {
    Extracted {
        reloaded: Option<Result<SessionInputs, WindsmithError>>,
        extraction: Extraction,
    },
    Generated {
        theme_revision: u64,
        theme: Option<Arc<ResolvedTheme>>,
        artifact: Result<BuildArtifact, WindsmithError>,
    },
}

struct InFlight {
    kind: PhaseKind,
    handle: JoinHandle<PhaseOutcome>,
}

/// Where a driver delivers new artifacts besides its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sink {
    File(PathBuf),
    Stdout,
    None,
}

/// Single owner of a live session's state.
///
/// Runs the [`RebuildCoordinator`] actions: extraction and generation run on
/// spawned tasks against immutable snapshots while the driver keeps
/// accepting changes and requests; results are merged back here only.
pub(crate) struct Driver {
    mode: BuildMode,
    options: Arc<ResolvedOptions>,
    generator: Arc<dyn Generator>,
    extractor: Arc<dyn Extractor>,
    sink: Sink,
    inputs: Option<Arc<SessionInputs>>,
    theme_revision: u64,
    resolved: Option<(u64, Arc<ResolvedTheme>)>,
    candidates: CandidateSet,
    entries: HashSet<PathBuf>,
    coordinator: RebuildCoordinator,
    in_flight: Option<InFlight>,
    waiting: Vec<Reply<Result<Arc<BuildArtifact>, WindsmithError>>>,
    artifact: Option<Arc<BuildArtifact>>,
    diagnostics: Vec<Diagnostic>,
    published: watch::Sender<Option<Arc<BuildArtifact>>>,
    watcher: Option<FileWatcher>,
}

impl Driver {
    pub fn new(
        mode: BuildMode,
        options: ResolvedOptions,
        generator: Arc<dyn Generator>,
        extractor: Arc<dyn Extractor>,
        sink: Sink,
        published: watch::Sender<Option<Arc<BuildArtifact>>>,
    ) -> Self {
        Self {
            mode,
            options: Arc::new(options),
            generator,
            extractor,
            sink,
            inputs: None,
            theme_revision: 0,
            resolved: None,
            candidates: CandidateSet::new(),
            entries: HashSet::new(),
            coordinator: RebuildCoordinator::new(),
            in_flight: None,
            waiting: Vec::new(),
            artifact: None,
            diagnostics: Vec::new(),
            published,
            watcher: None,
        }
    }

    pub fn with_watcher(mut self, watcher: FileWatcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Runs until `shutdown` resolves, or until every command sender is
    /// dropped when there is no file event source.
    #[instrument(skip_all, fields(mode = %self.mode, input = %self.options.input.display()))]
    pub async fn run(
        mut self,
        mut commands: Option<mpsc::Receiver<Command>>,
        mut events: Option<mpsc::UnboundedReceiver<FileEvent>>,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);

        let initial = self
            .coordinator
            .on_change(Change::Theme(self.options.input.clone()));
        self.step(initial);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Session shutting down");
                    break;
                }

                command = recv(&mut commands), if commands.is_some() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        commands = None;
                        if events.is_none() {
                            break;
                        }
                    }
                },

                event = recv_unbounded(&mut events), if events.is_some() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        events = None;
                        if commands.is_none() {
                            break;
                        }
                    }
                },

                (kind, outcome) = join_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.handle_outcome(kind, outcome).await;
                }
            }
        }

        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Stylesheet { entry, reply } => self.request_stylesheet(entry, reply),
            Command::Change(event) => self.handle_event(event),
            Command::Diagnostics { reply } => {
                let _ = reply.send(self.diagnostics.clone());
            }
            Command::Candidates { reply } => {
                let _ = reply.send(self.candidates.snapshot());
            }
        }
    }

    fn request_stylesheet(
        &mut self,
        entry: PathBuf,
        reply: Reply<Result<Arc<BuildArtifact>, WindsmithError>>,
    ) {
        let entry = normalize(&self.options.root.join(entry));

        if entry != self.options.input && self.entries.insert(entry.clone()) {
            debug!(entry = %entry.display(), "New dev entry");
            self.waiting.push(reply);
            let action = self.coordinator.on_change(Change::Source(entry));
            self.step(action);
            return;
        }

        if self.coordinator.is_idle() {
            let _ = reply.send(self.current_artifact());
        } else {
            self.waiting.push(reply);
        }
    }

    fn handle_event(&mut self, event: FileEvent) {
        let Some(change) = self.classify(&event.path) else {
            return;
        };
        debug!(?change, kind = ?event.kind, "Change");
        let action = self.coordinator.on_change(change);
        self.step(action);
    }

    fn classify(&self, path: &Path) -> Option<Change> {
        let path = normalize(path);

        if self.options.output.as_ref() == Some(&path) || path.is_dir() {
            return None;
        }
        let is_theme_file = self
            .inputs
            .as_ref()
            .map_or(path == self.options.input, |inputs| inputs.is_theme_file(&path));
        if is_theme_file {
            return Some(Change::Theme(path));
        }

        let inputs = self.inputs.as_ref()?;
        let is_source = match self.mode {
            BuildMode::Dev => {
                self.entries.contains(&path) || inputs.matcher.is_declared_source(&path)
            }
            BuildMode::Build | BuildMode::Watch => inputs.matcher.is_source(&path),
        };
        is_source.then_some(Change::Source(path))
    }

    /// Carries out coordinator actions until one needs to wait on a phase.
    fn step(&mut self, action: Action) {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            next = match action {
                Action::Extract(work) => {
                    self.start_extraction(work);
                    None
                }
                Action::Generate => self.start_generation(),
                Action::Settle => {
                    self.settle();
                    None
                }
                Action::Wait => None,
            };
        }
    }

    fn start_extraction(&mut self, work: ExtractionWork) {
        let options = Arc::clone(&self.options);
        let extractor = Arc::clone(&self.extractor);
        let previous: Option<SourceRegistry> =
            self.inputs.as_ref().map(|inputs| inputs.registry.clone());
        let mode = self.mode;

        let handle = tokio::spawn(async move {
            let mut paths = work.paths;
            let mut reloaded = None;

            if work.reload_theme {
                let loaded = tokio::task::spawn_blocking(move || {
                    let inputs = SessionInputs::load(&options)?;
                    let rescan = if previous.as_ref() != Some(&inputs.registry) {
                        match mode {
                            BuildMode::Dev => inputs.matcher.scan_declared(),
                            BuildMode::Build | BuildMode::Watch => inputs.matcher.scan(),
                        }
                    } else {
                        Vec::new()
                    };
                    Ok::<_, WindsmithError>((inputs, rescan))
                })
                .await
                .unwrap_or_else(|err| Err(join_error(err)));

                reloaded = Some(match loaded {
                    Ok((inputs, rescan)) => {
                        paths.extend(rescan);
                        Ok(inputs)
                    }
                    Err(err) => Err(err),
                });
            }

            let extraction = extract_candidates(&paths, extractor).await;
            PhaseOutcome::Extracted {
                reloaded,
                extraction,
            }
        });

        self.in_flight = Some(InFlight {
            kind: PhaseKind::Extraction,
            handle,
        });
    }

    fn start_generation(&mut self) -> Option<Action> {
        let Some(inputs) = self.inputs.clone() else {
            self.report(WindsmithError::Generation {
                details: "theme inputs could not be loaded".to_string(),
            });
            return Some(self.coordinator.on_generated());
        };

        let snapshot = self.candidates.snapshot();
        let theme_revision = self.theme_revision;

        if let Some(artifact) = &self.artifact
            && artifact.is_current(theme_revision, snapshot.revision())
        {
            debug!("Artifact is current, reusing it");
            return Some(self.coordinator.on_generated());
        }

        let cached = self
            .resolved
            .as_ref()
            .filter(|(revision, _)| *revision == theme_revision)
            .map(|(_, theme)| Arc::clone(theme));
        let generator = Arc::clone(&self.generator);

        let handle = tokio::task::spawn_blocking(move || {
            if !inputs.stylesheet.is_root() {
                let artifact = render(
                    &inputs.stylesheet,
                    &ResolvedTheme::default(),
                    &snapshot,
                    generator.as_ref(),
                    theme_revision,
                );
                return PhaseOutcome::Generated {
                    theme_revision,
                    theme: cached,
                    artifact,
                };
            }

            let theme = match cached {
                Some(theme) => Ok(theme),
                None => inputs.resolve_theme().map(Arc::new),
            };
            match theme {
                Ok(theme) => PhaseOutcome::Generated {
                    theme_revision,
                    artifact: render(
                        &inputs.stylesheet,
                        &theme,
                        &snapshot,
                        generator.as_ref(),
                        theme_revision,
                    ),
                    theme: Some(theme),
                },
                Err(err) => PhaseOutcome::Generated {
                    theme_revision,
                    theme: None,
                    artifact: Err(err),
                },
            }
        });

        self.in_flight = Some(InFlight {
            kind: PhaseKind::Generation,
            handle,
        });
        None
    }

    async fn handle_outcome(&mut self, kind: PhaseKind, outcome: Result<PhaseOutcome, JoinError>) {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(join_error(err));
                let action = match kind {
                    PhaseKind::Extraction => self.coordinator.on_extracted(false),
                    PhaseKind::Generation => self.coordinator.on_generated(),
                };
                self.step(action);
                return;
            }
        };

        let action = match outcome {
            PhaseOutcome::Extracted {
                reloaded,
                extraction,
            } => {
                match reloaded {
                    Some(Ok(inputs)) => self.install_inputs(inputs),
                    Some(Err(err)) => self.report(err),
                    None => {}
                }
                for failure in extraction.failures {
                    self.report(failure);
                }

                let changed = self.candidates.merge(extraction.candidates);
                debug!(
                    changed,
                    candidates = self.candidates.len(),
                    "Merged candidates"
                );
                self.coordinator.on_extracted(changed)
            }
            PhaseOutcome::Generated {
                theme_revision,
                theme,
                artifact,
            } => {
                if let Some(theme) = theme {
                    self.resolved = Some((theme_revision, theme));
                }
                match artifact {
                    Ok(artifact) => self.install_artifact(artifact).await,
                    Err(err) => self.report(err),
                }
                self.coordinator.on_generated()
            }
        };

        self.step(action);
    }

    fn install_inputs(&mut self, inputs: SessionInputs) {
        self.theme_revision += 1;
        self.resolved = None;
        if !inputs.stylesheet.is_root() {
            info!("Input is not a compilation root, passing it through");
        }

        if let Some(watcher) = self.watcher.as_mut() {
            let errors = watcher.update(inputs.matcher.roots(), &inputs.theme_files);
            for err in errors {
                self.report(err);
            }
        }

        self.inputs = Some(Arc::new(inputs));
    }

    async fn install_artifact(&mut self, artifact: BuildArtifact) {
        let unchanged = self
            .artifact
            .as_ref()
            .is_some_and(|current| current.css() == artifact.css());
        let artifact = Arc::new(artifact);
        self.artifact = Some(Arc::clone(&artifact));

        if unchanged {
            debug!("Stylesheet text unchanged");
            return;
        }

        info!(
            bytes = artifact.css().len(),
            candidates = self.candidates.len(),
            "Stylesheet rebuilt"
        );

        match self.sink.clone() {
            Sink::File(path) => {
                if let Err(err) = write_output(&path, artifact.css()).await {
                    self.report(WindsmithError::Io(err));
                }
            }
            Sink::Stdout => println!("{}", artifact.css()),
            Sink::None => {}
        }

        self.published.send_replace(Some(artifact));
    }

    fn settle(&mut self) {
        debug!(cycles = self.coordinator.cycles(), "Cycle settled");
        for reply in std::mem::take(&mut self.waiting) {
            let _ = reply.send(self.current_artifact());
        }
    }

    fn current_artifact(&self) -> Result<Arc<BuildArtifact>, WindsmithError> {
        self.artifact.clone().ok_or_else(|| WindsmithError::Generation {
            details: match self.diagnostics.last() {
                Some(last) => format!("no stylesheet available: {}", last.message),
                None => "no stylesheet available".to_string(),
            },
        })
    }

    fn report(&mut self, err: WindsmithError) {
        let diagnostic = if err.is_fatal_for(self.mode) {
            Diagnostic::error(&err)
        } else {
            Diagnostic::warning(&err)
        };
        warn!(error = %err, "Diagnostic");

        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.remove(0);
        }
        self.diagnostics.push(diagnostic);
    }
}

async fn recv<T>(receiver: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn recv_unbounded<T>(receiver: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn join_in_flight(
    in_flight: &mut Option<InFlight>,
) -> (PhaseKind, Result<PhaseOutcome, JoinError>) {
    match in_flight {
        Some(in_flight) => (in_flight.kind, (&mut in_flight.handle).await),
        None => std::future::pending().await,
    }
}

async fn write_output(path: &Path, css: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, css).await
}

fn join_error(err: JoinError) -> WindsmithError {
    WindsmithError::Generation {
        details: format!("background task failed: {err}"),
    }
}
