use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashMap,
    },
    time::Instant,
};

use rayon::iter::{
    IntoParallelIterator,
    ParallelIterator,
};
use serde::Serialize;

use super::{
    config::MatchingConfig,
    CardId,
    LessonWord,
    Result,
    SourceFailure,
    SourceId,
    VocabularyIndex,
};
use crate::{
    matching::{
        CandidateSelector,
        Levenshtein,
        Scorer,
        WordMatch,
    },
    persistence::{
        Approval,
        MatchStore,
    },
    segmentation::{
        LessonBatch,
        LessonExtractor,
    },
    tags::TagCodec,
};

#[derive(Debug, Clone, Serialize)]
pub struct MatchedWord<'a> {
    pub lesson_word: &'a LessonWord,
    pub candidates: Vec<WordMatch<'a>>,
}

/// Outcome of one lesson source. Words keep their batch order.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport<'a> {
    pub source_id: SourceId,
    pub matched: Vec<MatchedWord<'a>>,
    pub unmatched: Vec<&'a LessonWord>,
    /// Words that already have an approved match
    pub skipped: Vec<&'a LessonWord>,
}

impl SourceReport<'_> {
    fn new(source_id: SourceId) -> Self {
        Self { source_id, matched: Vec::new(), unmatched: Vec::new(), skipped: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub words: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub skipped: usize,
    /// Words with no letters left after normalization
    pub rejected: usize,
    pub failed_sources: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordState {
    Pending,
    Skipped,
    Rejected,
}

/// Advisory suggestions for human review; nothing in it is approved yet.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport<'a> {
    pub sources: Vec<SourceReport<'a>>,
    /// Unreadable sources and rejected words
    pub failures: Vec<SourceFailure>,
    pub summary: ReportSummary,
}

impl<'a> MatchReport<'a> {
    pub fn source(&self, source_id: &SourceId) -> Option<&SourceReport<'a>> {
        self.sources.iter().find(|report| &report.source_id == source_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTagUpdate {
    pub card_id: CardId,
    /// Earliest lesson the card's word was approved in
    pub lesson: u32,
    pub tags: Vec<String>,
    pub already_tagged: bool,
}

/// Tags to write back, one update per card, ordered by card id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagPlan {
    pub deck_tag: String,
    pub updates: Vec<CardTagUpdate>,
}

impl TagPlan {
    /// Updates for cards that do not carry their tags yet.
    pub fn pending(&self) -> impl Iterator<Item = &CardTagUpdate> + '_ {
        self.updates.iter().filter(|update| !update.already_tagged)
    }
}

pub struct Orchestrator<S = Levenshtein> {
    config: MatchingConfig,
    selector: CandidateSelector<S>,
    codec: TagCodec,
}

impl Orchestrator<Levenshtein> {
    pub fn new(config: MatchingConfig) -> Result<Self> {
        Self::with_scorer(config, Levenshtein)
    }
}

impl<S: Scorer> Orchestrator<S> {
    pub fn with_scorer(config: MatchingConfig, scorer: S) -> Result<Self> {
        config.validate()?;
        let selector = CandidateSelector::with_scorer(scorer).with_thresholds(config.thresholds);
        let codec = TagCodec::new(&config.deck_name)?;
        Ok(Self { config, selector, codec })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn codec(&self) -> &TagCodec {
        &self.codec
    }

    /// A fresh extractor with this orchestrator's word filters.
    pub fn extractor(&self) -> LessonExtractor {
        LessonExtractor::new(self.config.min_word_length, self.config.first_occurrence_only)
    }

    /// Finds candidates for every lesson word in `batch`.
    ///
    /// With a store, words already approved for their source are skipped and
    /// words without any candidate are logged as unmatched. Words with no
    /// letters are reported as failures of their source and never scored. The
    /// report is in batch order whether or not the search runs in parallel.
    pub fn match_batch<'a>(
        &self,
        batch: &'a LessonBatch,
        index: &'a VocabularyIndex,
        mut store: Option<&mut MatchStore>,
    ) -> Result<MatchReport<'a>> {
        let start = Instant::now();

        // letterless words are malformed input; they become failures, not matches
        let states: Vec<WordState> = batch
            .words
            .iter()
            .map(|word| {
                if word.normalized_form().is_empty() {
                    WordState::Rejected
                } else if store.as_deref().is_some_and(|s| s.is_processed(word.source_id(), word.normalized_form())) {
                    WordState::Skipped
                } else {
                    WordState::Pending
                }
            })
            .collect();
        let pending: Vec<&'a LessonWord> = batch
            .words
            .iter()
            .zip(&states)
            .filter(|(_, state)| **state == WordState::Pending)
            .map(|(word, _)| word)
            .collect();

        let max_distance = self.config.max_distance;
        let max_candidates = self.config.max_candidates;
        let candidates: Vec<Vec<WordMatch<'a>>> = if self.config.parallel {
            pending
                .into_par_iter()
                .map(|word| self.selector.select(word, index, max_distance, max_candidates))
                .collect::<Result<_>>()?
        } else {
            pending
                .into_iter()
                .map(|word| self.selector.select(word, index, max_distance, max_candidates))
                .collect::<Result<_>>()?
        };

        let mut sources: Vec<SourceReport<'a>> = Vec::new();
        let mut positions: HashMap<&SourceId, usize> = HashMap::new();
        let mut failures = batch.failures.clone();
        let mut summary = ReportSummary::default();
        let mut candidates = candidates.into_iter();

        for (word, state) in batch.words.iter().zip(states) {
            summary.words += 1;
            if state == WordState::Rejected {
                failures.push(SourceFailure::new(
                    word.source_id().to_string(),
                    format!("lesson word {:?} has no Hebrew letters", word.surface_form()),
                ));
                summary.rejected += 1;
                continue;
            }

            let position = *positions.entry(word.source_id()).or_insert_with(|| {
                sources.push(SourceReport::new(word.source_id().clone()));
                sources.len() - 1
            });
            let report = &mut sources[position];

            if state == WordState::Skipped {
                report.skipped.push(word);
                summary.skipped += 1;
                continue;
            }

            match candidates.next() {
                Some(found) if !found.is_empty() => {
                    report.matched.push(MatchedWord { lesson_word: word, candidates: found });
                    summary.matched += 1;
                }
                _ => {
                    report.unmatched.push(word);
                    summary.unmatched += 1;
                }
            }
        }

        if let Some(store) = store.as_deref_mut() {
            let added = store.record_unmatched_words(sources.iter().flat_map(|s| s.unmatched.iter().copied()))?;
            tracing::debug!("{} new unmatched words logged", added);
        }

        tracing::info!(
            "Matched {} of {} words against {} entries ({} unmatched, {} skipped, {} rejected, {:.1}s)",
            summary.matched,
            summary.words,
            index.len(),
            summary.unmatched,
            summary.skipped,
            summary.rejected,
            start.elapsed().as_secs_f32()
        );

        summary.failed_sources = batch.failures.len();
        Ok(MatchReport { sources, failures, summary })
    }

    /// Replays approvals into the store, then works out the tags for every
    /// card they touch. A card's lesson tag is the earliest lesson any stored
    /// match places it in. `index` supplies the card's current tags, if known.
    pub fn apply_approvals(
        &self,
        approvals: &[Approval],
        store: &mut MatchStore,
        index: Option<&VocabularyIndex>,
    ) -> Result<TagPlan> {
        let applied = store.record_approvals(approvals)?;
        tracing::info!("Recorded {} approvals", applied);

        let cards: BTreeSet<CardId> = approvals.iter().map(|approval| approval.card_id).collect();
        let mut earliest: BTreeMap<CardId, u32> = BTreeMap::new();
        for stored in store.matches().filter(|stored| cards.contains(&stored.card_id)) {
            let lesson = stored.source_id.lesson_number();
            earliest.entry(stored.card_id).and_modify(|current| *current = (*current).min(lesson)).or_insert(lesson);
        }

        let updates: Vec<CardTagUpdate> = earliest
            .into_iter()
            .map(|(card_id, lesson)| {
                let already_tagged = index
                    .and_then(|index| index.find_card(card_id))
                    .is_some_and(|entry| self.codec.is_tagged(entry.tags(), lesson));
                CardTagUpdate { card_id, lesson, tags: self.codec.generate(lesson).to_vec(), already_tagged }
            })
            .collect();

        let plan = TagPlan { deck_tag: self.codec.deck_tag().to_string(), updates };
        tracing::info!("{} cards to tag ({} already tagged)", plan.updates.len(), plan.updates.len() - plan.pending().count());
        Ok(plan)
    }
}
