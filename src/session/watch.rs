use std::{future::Future, sync::Arc};

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::{
    candidates::Extractor,
    core::{BuildMode, WindsmithError},
    generator::Generator,
};

use super::{
    driver::{Driver, Sink},
    inputs::ResolvedOptions,
    watcher::FileWatcher,
};

/// Rebuilds on every relevant change until `shutdown` resolves.
///
/// Source roots and theme files are watched; the watch list follows the
/// registry whenever theme inputs are reloaded. Problems after startup are
/// logged as diagnostics and the last good stylesheet stays in place.
///
/// # Errors
/// Returns an error if the file watcher cannot be created.
#[instrument(skip_all, fields(input = %options.input.display()))]
pub(crate) async fn run(
    options: ResolvedOptions,
    generator: Arc<dyn Generator>,
    extractor: Arc<dyn Extractor>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), WindsmithError> {
    let (mut watcher, events) = FileWatcher::new()?;
    for err in watcher.update(std::slice::from_ref(&options.root), &[options.input.clone()]) {
        warn!(error = %err, "Initial watch failed");
    }

    let sink = match &options.output {
        Some(path) => Sink::File(path.clone()),
        None => Sink::Stdout,
    };
    let (published, _artifacts) = watch::channel(None);

    info!("Watching for changes");
    Driver::new(BuildMode::Watch, options, generator, extractor, sink, published)
        .with_watcher(watcher)
        .run(None, Some(events), shutdown)
        .await;
    Ok(())
}
