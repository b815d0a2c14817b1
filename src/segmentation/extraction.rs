//! Pulls candidate vocabulary out of lesson phrases.

use std::collections::HashSet;

use serde::Serialize;

use super::{
    normalizer::normalize,
    tokenizer::hebrew_words,
};
use crate::core::{
    LessonSource,
    LessonWord,
    SourceFailure,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub sources: usize,
    /// Word tokens seen, before any filtering
    pub total_words: usize,
    /// Distinct normalized words across the batch
    pub unique_words: usize,
    /// Words handed on for matching
    pub new_words: usize,
    pub too_short: usize,
}

/// Lesson words ready for matching, plus the sources that could not be read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LessonBatch {
    pub words: Vec<LessonWord>,
    pub failures: Vec<SourceFailure>,
}

impl LessonBatch {
    pub fn from_words(words: Vec<LessonWord>) -> Self {
        Self { words, failures: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.failures.is_empty()
    }
}

/// Turns lesson sources into [`LessonWord`]s. Remembers every word it has
/// emitted, so feeding lessons in course order keeps only first occurrences.
#[derive(Debug, Clone)]
pub struct LessonExtractor {
    min_word_length: usize,
    first_occurrence_only: bool,
    seen: HashSet<String>,
    stats: ExtractionStats,
}

impl Default for LessonExtractor {
    fn default() -> Self {
        Self::new(2, true)
    }
}

impl LessonExtractor {
    pub fn new(min_word_length: usize, first_occurrence_only: bool) -> Self {
        Self { min_word_length, first_occurrence_only, seen: HashSet::new(), stats: ExtractionStats::default() }
    }

    /// Marks words as already introduced, e.g. from lessons processed earlier.
    pub fn with_known_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.seen.extend(words.into_iter().map(|w| normalize(w.as_ref())).filter(|w| !w.is_empty()));
        self
    }

    pub fn stats(&self) -> ExtractionStats {
        ExtractionStats { unique_words: self.seen.len(), ..self.stats }
    }

    /// Words of one source, each paired with the phrase it came from. Words
    /// repeated within the source are emitted once.
    pub fn extract(&mut self, source: &LessonSource) -> Vec<LessonWord> {
        self.stats.sources += 1;
        let mut in_source: HashSet<String> = HashSet::new();
        let mut words = Vec::new();

        for phrase in &source.phrases {
            for surface in hebrew_words(phrase) {
                self.stats.total_words += 1;
                let normalized = normalize(surface);
                if normalized.chars().count() < self.min_word_length {
                    self.stats.too_short += 1;
                    continue;
                }
                if !in_source.insert(normalized.clone()) {
                    continue;
                }

                let first_time = self.seen.insert(normalized);
                if self.first_occurrence_only && !first_time {
                    continue;
                }

                words.push(LessonWord::new(surface, source.source_id.clone(), phrase.trim()));
            }
        }

        self.stats.new_words += words.len();
        tracing::debug!("{}: {} words extracted", source.source_id, words.len());
        words
    }

    /// Extracts every readable source in order; unreadable ones are carried
    /// into the batch as failures.
    pub fn extract_batch<I>(&mut self, sources: I) -> LessonBatch
    where
        I: IntoIterator<Item = Result<LessonSource, SourceFailure>>,
    {
        let mut batch = LessonBatch::default();
        for source in sources {
            match source {
                Ok(source) => {
                    let words = self.extract(&source);
                    batch.words.extend(words);
                }
                Err(failure) => {
                    tracing::warn!("Skipping source {}: {}", failure.source, failure.reason);
                    batch.failures.push(failure);
                }
            }
        }

        let stats = self.stats();
        tracing::info!(
            "Extracted {} words ({} unique, {} new) from {} sources",
            stats.total_words,
            stats.unique_words,
            stats.new_words,
            stats.sources
        );
        batch
    }
}
