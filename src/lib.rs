//! Hebrew lesson vocabulary matching and flashcard tagging.
//!
//! Lesson phrases are tokenized and normalized, each new word is scored
//! against the existing flashcard vocabulary, and approved matches are kept
//! in a persistent store from which per-card lesson tags are derived.

pub mod core;
pub mod matching;
pub mod persistence;
pub mod segmentation;
pub mod tags;

pub use crate::core::{
    MatchingConfig,
    Orchestrator,
    Result,
    UlpanError,
};
pub use matching::{
    CandidateSelector,
    Confidence,
};
pub use persistence::MatchStore;
pub use segmentation::normalize;
