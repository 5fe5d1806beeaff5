//! Candidate collection.
//!
//! A candidate is any class-like token found in a source file. Candidates are
//! collected into a [`CandidateSet`] that only ever grows during a session.

mod extract;
mod set;
mod tokenizer;

#[cfg(test)]
mod tests;

pub use extract::{Extraction, Extractor, extract_candidates, extract_file};
pub use set::{CandidateSet, CandidateSnapshot};
pub use tokenizer::ClassTokenizer;
