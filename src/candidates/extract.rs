use std::{
    collections::BTreeSet,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::stream::{self, StreamExt};
use tracing::{debug, instrument, warn};

use crate::core::WindsmithError;

const CONCURRENT_FILES: usize = 16;

/// Lexical tokenizer turning file contents into candidate strings.
pub trait Extractor: Send + Sync {
    /// Returns every class-like token in `contents`.
    fn extract(&self, contents: &str) -> BTreeSet<String>;
}

/// The outcome of extracting a batch of files.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Union of the candidates of every file that could be read
    pub candidates: BTreeSet<String>,
    /// Files that were skipped, one error each
    pub failures: Vec<WindsmithError>,
}

/// Extracts candidates from `files` in parallel.
///
/// Files that no longer exist contribute nothing. Files that cannot be read
/// or are not UTF-8 are reported in [`Extraction::failures`] and skipped;
/// they never abort the batch.
#[instrument(skip_all, fields(files = files.len()))]
pub async fn extract_candidates(files: &[PathBuf], extractor: Arc<dyn Extractor>) -> Extraction {
    let results: Vec<_> = stream::iter(files.iter().cloned())
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            async move { extract_file(&path, extractor).await }
        })
        .buffer_unordered(CONCURRENT_FILES)
        .collect()
        .await;

    let mut extraction = Extraction::default();
    for result in results {
        match result {
            Ok(candidates) => extraction.candidates.extend(candidates),
            Err(err) => {
                warn!(error = %err, "Skipping source file");
                extraction.failures.push(err);
            }
        }
    }

    debug!(
        candidates = extraction.candidates.len(),
        failures = extraction.failures.len(),
        "Extracted candidates"
    );
    extraction
}

/// Extracts candidates from a single file.
///
/// # Errors
/// Returns `WindsmithError::Extraction` if the file cannot be read or is not
/// valid UTF-8. A missing file yields an empty set.
pub async fn extract_file(
    path: &Path,
    extractor: Arc<dyn Extractor>,
) -> Result<BTreeSet<String>, WindsmithError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(err) => return Err(WindsmithError::extraction(path, err)),
    };

    let contents = String::from_utf8(bytes).map_err(|err| WindsmithError::extraction(path, err))?;

    tokio::task::spawn_blocking(move || extractor.extract(&contents))
        .await
        .map_err(|err| WindsmithError::extraction(path, err))
}
