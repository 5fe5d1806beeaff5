#![allow(clippy::unwrap_used)]

use std::{fs, sync::Arc};

use tempfile::TempDir;

use crate::{
    candidates::{CandidateSet, ClassTokenizer, Extractor, extract_candidates},
    core::WindsmithError,
};

fn tokenizer() -> Arc<dyn Extractor> {
    Arc::new(ClassTokenizer)
}

#[test]
fn merge_is_a_union_and_tracks_growth() {
    let mut set = CandidateSet::new();

    assert!(set.merge(["flex", "p-4"]));
    assert_eq!(set.revision(), 1);

    assert!(!set.merge(["flex"]));
    assert!(!set.merge(Vec::<String>::new()));
    assert_eq!(set.revision(), 1);

    assert!(set.merge(["flex", "underline"]));
    assert_eq!(set.revision(), 2);
    assert_eq!(set.len(), 3);
}

#[test]
fn snapshots_are_immutable() {
    let mut set: CandidateSet = ["flex"].into_iter().collect();
    let before = set.snapshot();

    set.merge(["grid"]);

    assert!(!before.contains("grid"));
    assert_eq!(before.len(), 1);
    assert!(set.snapshot().contains("grid"));
    assert_ne!(before, set.snapshot());
}

#[test]
fn candidates_are_never_removed() {
    let mut set: CandidateSet = ["flex", "p-4"].into_iter().collect();

    // A file that used to contribute candidates is now empty.
    let changed = set.merge(ClassTokenizer.extract(""));

    assert!(!changed);
    assert!(set.contains("flex"));
    assert!(set.contains("p-4"));
}

#[tokio::test]
async fn extracts_files_in_parallel() {
    let dir = TempDir::new().unwrap();
    let mut files = Vec::new();
    for i in 0..40 {
        let path = dir.path().join(format!("page-{i}.html"));
        fs::write(&path, format!("<p class=\"m-{i} text-center\"></p>")).unwrap();
        files.push(path);
    }

    let extraction = extract_candidates(&files, tokenizer()).await;

    assert!(extraction.failures.is_empty());
    assert!(extraction.candidates.contains("text-center"));
    for i in 0..40 {
        assert!(extraction.candidates.contains(&format!("m-{i}")));
    }
}

#[tokio::test]
async fn unreadable_files_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.html");
    let binary = dir.path().join("blob.txt");
    let missing = dir.path().join("deleted.html");
    fs::write(&good, "<b class=\"font-bold\"></b>").unwrap();
    fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let extraction = extract_candidates(&[good, binary.clone(), missing], tokenizer()).await;

    assert!(extraction.candidates.contains("font-bold"));
    assert_eq!(extraction.failures.len(), 1);
    match &extraction.failures[0] {
        WindsmithError::Extraction { path, .. } => assert_eq!(path, &binary),
        other => unreachable!("expected an extraction error, got {other:?}"),
    }
}
