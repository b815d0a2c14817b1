pub mod scoring;
pub mod selector;

pub use scoring::{
    classify,
    distance,
    Confidence,
    ConfidenceThresholds,
    Levenshtein,
    Scorer,
};
pub use selector::{
    CandidateSelector,
    WordMatch,
};
