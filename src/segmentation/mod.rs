pub mod extraction;
pub mod normalizer;
pub mod token;
pub mod tokenizer;

pub use extraction::{
    ExtractionStats,
    LessonBatch,
    LessonExtractor,
};
pub use normalizer::normalize;
pub use token::{
    Token,
    TokenClass,
};
pub use tokenizer::{
    hebrew_words,
    tokenize,
};
