use serde::Serialize;

use super::scoring::{
    Confidence,
    ConfidenceThresholds,
    Levenshtein,
    Scorer,
};
use crate::core::{
    LessonWord,
    Result,
    UlpanError,
    VocabularyEntry,
    VocabularyIndex,
};

/// A scored pairing of a lesson word with a vocabulary entry. Borrowed from
/// the batch and the index, both of which outlive it.
#[derive(Debug, Clone, Serialize)]
pub struct WordMatch<'a> {
    #[serde(skip)]
    pub lesson_word: &'a LessonWord,
    pub entry: &'a VocabularyEntry,
    pub distance: usize,
    pub confidence: Confidence,
}

/// Finds the closest vocabulary entries for a lesson word.
///
/// Scoring is a full scan: N entries times M lesson words, each scored in
/// O(L²) for word length L. With a length-bounded scorer (edit distance) the
/// scan is narrowed to entries whose length differs by at most
/// `max_distance`, which never drops a real candidate.
#[derive(Debug, Clone)]
pub struct CandidateSelector<S = Levenshtein> {
    scorer: S,
    thresholds: ConfidenceThresholds,
}

impl Default for CandidateSelector<Levenshtein> {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSelector<Levenshtein> {
    pub fn new() -> Self {
        Self::with_scorer(Levenshtein)
    }
}

impl<S: Scorer> CandidateSelector<S> {
    pub fn with_scorer(scorer: S) -> Self {
        Self { scorer, thresholds: ConfidenceThresholds::default() }
    }

    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    /// Up to `max_candidates` entries within `max_distance`, closest first.
    /// Equal distances are ordered by surface form, then card id, so the
    /// result never depends on index insertion order.
    ///
    /// An empty result means the word is unmatched. A word with no letters
    /// matches nothing. `max_candidates == 0` is rejected.
    pub fn select<'a>(
        &self,
        lesson_word: &'a LessonWord,
        index: &'a VocabularyIndex,
        max_distance: usize,
        max_candidates: usize,
    ) -> Result<Vec<WordMatch<'a>>> {
        if max_candidates == 0 {
            return Err(UlpanError::InvalidArgument("max_candidates must be at least 1".to_string()));
        }

        let target = lesson_word.normalized_form();
        if target.is_empty() {
            return Ok(Vec::new());
        }
        let pool: Box<dyn Iterator<Item = &'a VocabularyEntry> + 'a> = if self.scorer.bounded_by_length() {
            Box::new(index.within_length(target.chars().count(), max_distance))
        } else {
            Box::new(index.entries().iter())
        };

        let mut matches: Vec<WordMatch<'a>> = pool
            .filter_map(|entry| {
                let distance = self.scorer.score(target, entry.normalized_form());
                (distance <= max_distance).then(|| WordMatch {
                    lesson_word,
                    entry,
                    distance,
                    confidence: self.thresholds.classify(distance),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| a.entry.surface_form().cmp(b.entry.surface_form()))
                .then_with(|| a.entry.card_id().cmp(&b.entry.card_id()))
        });
        matches.truncate(max_candidates);

        Ok(matches)
    }
}
