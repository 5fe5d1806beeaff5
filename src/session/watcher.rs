use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::WindsmithError;

/// A file system event for a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// The path of the file that changed
    pub path: PathBuf,
    /// The type of change that occurred
    pub kind: FileEventKind,
}

impl FileEvent {
    /// Creates an event.
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// The type of file system change that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created
    Created,
    /// File was modified
    Modified,
    /// File was removed
    Removed,
}

/// Async interface over a notify watcher.
///
/// Directories are watched recursively and single files non-recursively.
/// Events are forwarded on an unbounded channel; duplicates and reordering
/// are possible and left to the consumer.
pub(crate) struct FileWatcher {
    watcher: RecommendedWatcher,
    watched: HashMap<PathBuf, RecursiveMode>,
}

impl FileWatcher {
    /// Creates a watcher and the receiver its events arrive on.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<FileEvent>), WindsmithError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "File watcher error");
                    return;
                }
            };

            let kind = match event.kind {
                EventKind::Create(_) => FileEventKind::Created,
                EventKind::Modify(_) => FileEventKind::Modified,
                EventKind::Remove(_) => FileEventKind::Removed,
                _ => return,
            };

            for path in event.paths {
                let _ = event_tx.send(FileEvent { path, kind });
            }
        })
        .map_err(|err| WindsmithError::watch("<watcher>", err))?;

        Ok((
            Self {
                watcher,
                watched: HashMap::new(),
            },
            event_rx,
        ))
    }

    fn watch(&mut self, path: &Path, mode: RecursiveMode) -> Result<(), WindsmithError> {
        if self.watched.get(path) == Some(&mode) {
            return Ok(());
        }
        if self.watched.remove(path).is_some() {
            let _ = self.watcher.unwatch(path);
        }

        self.watcher
            .watch(path, mode)
            .map_err(|err| WindsmithError::watch(path, err))?;
        self.watched.insert(path.to_path_buf(), mode);
        Ok(())
    }

    /// Replaces the watch list.
    ///
    /// Paths that do not exist are skipped. A failure on one path is
    /// returned in the error list and does not stop the others.
    pub fn update(&mut self, directories: &[PathBuf], files: &[PathBuf]) -> Vec<WindsmithError> {
        let mut wanted: HashMap<PathBuf, RecursiveMode> = HashMap::new();
        for dir in directories.iter().filter(|dir| dir.is_dir()) {
            wanted.insert(dir.clone(), RecursiveMode::Recursive);
        }
        for file in files.iter().filter(|file| file.exists()) {
            if !directories.iter().any(|dir| file.starts_with(dir)) {
                wanted.entry(file.clone()).or_insert(RecursiveMode::NonRecursive);
            }
        }

        let stale: Vec<PathBuf> = self
            .watched
            .keys()
            .filter(|path| !wanted.contains_key(*path))
            .cloned()
            .collect();
        for path in stale {
            self.watched.remove(&path);
            if let Err(err) = self.watcher.unwatch(&path) {
                debug!(path = %path.display(), error = %err, "Unwatch failed");
            }
        }

        let mut errors = Vec::new();
        for (path, mode) in wanted {
            if let Err(err) = self.watch(&path, mode) {
                errors.push(err);
            }
        }

        debug!(watched = self.watched.len(), "Updated watch list");
        errors
    }
}
