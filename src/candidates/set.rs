use std::{collections::BTreeSet, sync::Arc};

/// Session-scoped, append-only set of class candidates.
///
/// Entries are never removed. Every merge that adds at least one new
/// candidate bumps the revision, so a revision identifies the exact set
/// content a build artifact was generated from.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Arc<BTreeSet<String>>,
    revision: u64,
}

/// An immutable view of a [`CandidateSet`] at one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSnapshot {
    candidates: Arc<BTreeSet<String>>,
    revision: u64,
}

impl CandidateSet {
    /// Creates an empty set at revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions `new` into the set. Returns whether the set grew.
    pub fn merge<I, S>(&mut self, new: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();
        for candidate in new {
            let candidate = candidate.as_ref();
            if !self.candidates.contains(candidate) {
                added.push(candidate.to_string());
            }
        }

        if added.is_empty() {
            return false;
        }

        Arc::make_mut(&mut self.candidates).extend(added);
        self.revision += 1;
        true
    }

    /// Whether `candidate` has been seen.
    pub fn contains(&self, candidate: &str) -> bool {
        self.candidates.contains(candidate)
    }

    /// Number of distinct candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidate has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Current revision; 0 until the first non-empty merge.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// A cheap, immutable snapshot of the current content.
    pub fn snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot {
            candidates: Arc::clone(&self.candidates),
            revision: self.revision,
        }
    }
}

impl CandidateSnapshot {
    /// Candidates in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(String::as_str)
    }

    /// Whether `candidate` is part of this snapshot.
    pub fn contains(&self, candidate: &str) -> bool {
        self.candidates.contains(candidate)
    }

    /// Number of candidates in this snapshot.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Revision of the set this snapshot was taken from.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl<S: AsRef<str>> FromIterator<S> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = CandidateSet::new();
        set.merge(iter);
        set
    }
}
