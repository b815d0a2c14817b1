pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod vocabulary;

pub use config::MatchingConfig;
pub use errors::{
    Result,
    UlpanError,
};
pub use models::{
    CardId,
    LessonSource,
    LessonWord,
    SourceFailure,
    SourceId,
};
pub use pipeline::{
    CardTagUpdate,
    MatchReport,
    MatchedWord,
    Orchestrator,
    ReportSummary,
    SourceReport,
    TagPlan,
};
pub use vocabulary::{
    IndexStats,
    VocabularyEntry,
    VocabularyIndex,
    VocabularyRecord,
};
