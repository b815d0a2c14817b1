//! Approved lesson-word matches and the log of words nothing matched.
//!
//! Everything lives in memory and is written back to a single JSON file after
//! every mutation. The store assumes one process writes it at a time.

use std::{
    collections::{
        BTreeMap,
        BTreeSet,
    },
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    atomic_write,
    get_data_file_path,
};
use crate::{
    core::{
        CardId,
        LessonWord,
        Result,
        SourceId,
        UlpanError,
    },
    matching::Confidence,
    segmentation::normalizer::normalize,
};

const STORE_VERSION: u32 = 1;
const DEFAULT_STORE_FILE: &str = "matches.json";

type WordKey = (SourceId, String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMatch {
    pub source_id: SourceId,
    /// Normalized lesson word
    pub lesson_word: String,
    pub card_id: CardId,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default = "Utc::now")]
    pub approved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedWord {
    pub source_id: SourceId,
    /// Normalized lesson word
    pub lesson_word: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "one")]
    pub attempts: u32,
}

fn one() -> u32 {
    1
}

/// A human decision to pair a lesson word with a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub source_id: SourceId,
    /// Surface or normalized form; the store normalizes it
    pub lesson_word: String,
    pub card_id: CardId,
    pub confidence: Confidence,
    #[serde(default)]
    pub distance: Option<usize>,
    #[serde(default)]
    pub matched_surface: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
}

impl Approval {
    pub fn new(source_id: SourceId, lesson_word: impl Into<String>, card_id: CardId, confidence: Confidence) -> Self {
        Self {
            source_id,
            lesson_word: lesson_word.into(),
            card_id,
            confidence,
            distance: None,
            matched_surface: None,
            translation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatistics {
    pub lessons_processed: usize,
    pub total_matches: usize,
    pub by_confidence: BTreeMap<Confidence, usize>,
    pub unmatched_count: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    matches: Vec<StoredMatch>,
    #[serde(default)]
    unmatched: Vec<UnmatchedWord>,
}

#[derive(Debug)]
pub struct MatchStore {
    path: PathBuf,
    matches: BTreeMap<WordKey, StoredMatch>,
    unmatched: BTreeMap<WordKey, UnmatchedWord>,
    dirty: bool,
}

fn word_key(source_id: &SourceId, lesson_word: &str) -> Result<WordKey> {
    let normalized = normalize(lesson_word);
    if normalized.is_empty() {
        return Err(UlpanError::InvalidArgument(format!(
            "lesson word {lesson_word:?} has no letters left after normalization"
        )));
    }
    Ok((source_id.clone(), normalized))
}

fn loaded_key(path: &Path, source_id: &SourceId, lesson_word: &str) -> Result<WordKey> {
    word_key(source_id, lesson_word).map_err(|_| UlpanError::CorruptStore {
        path: path.to_path_buf(),
        source: <serde_json::Error as serde::de::Error>::custom(format!(
            "stored word {lesson_word:?} for {source_id} has no letters"
        )),
    })
}

impl MatchStore {
    /// Loads the store at `path`. A missing file is an empty store; a file
    /// that cannot be read or parsed is an error, never silently emptied.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self { path, matches: BTreeMap::new(), unmatched: BTreeMap::new(), dirty: false };

        if !store.path.exists() {
            tracing::info!("No match store at {}, starting empty", store.path.display());
            return Ok(store);
        }

        let json = fs::read_to_string(&store.path)?;
        let file: StoreFile = serde_json::from_str(&json)
            .map_err(|source| UlpanError::CorruptStore { path: store.path.clone(), source })?;

        if file.version != STORE_VERSION {
            return Err(UlpanError::Custom(format!(
                "match store {} has version {}, expected {}",
                store.path.display(),
                file.version,
                STORE_VERSION
            )));
        }

        // rows are re-keyed on their normalized word; hand edits may not be
        for mut stored in file.matches {
            let key = loaded_key(&store.path, &stored.source_id, &stored.lesson_word)?;
            store.dirty |= key.1 != stored.lesson_word;
            stored.lesson_word = key.1.clone();
            store.matches.insert(key, stored);
        }
        for mut word in file.unmatched {
            let key = loaded_key(&store.path, &word.source_id, &word.lesson_word)?;
            store.dirty |= key.1 != word.lesson_word;
            word.lesson_word = key.1.clone();
            store.unmatched.insert(key, word);
        }

        tracing::info!(
            "Loaded {} stored matches, {} unmatched words from {}",
            store.matches.len(),
            store.unmatched.len(),
            store.path.display()
        );
        Ok(store)
    }

    /// Opens `matches.json` in the application data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(get_data_file_path(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upserts the match for (`source_id`, `lesson_word`).
    pub fn record_approved(
        &mut self,
        source_id: &SourceId,
        lesson_word: &str,
        card_id: CardId,
        confidence: Confidence,
    ) -> Result<()> {
        self.record_approval(&Approval::new(source_id.clone(), lesson_word, card_id, confidence))
    }

    pub fn record_approval(&mut self, approval: &Approval) -> Result<()> {
        self.apply_approval(approval)?;
        self.flush()
    }

    /// Applies every approval, then flushes once. Returns how many were applied.
    pub fn record_approvals<'a, I>(&mut self, approvals: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Approval>,
    {
        let mut applied = 0;
        let mut outcome = Ok(());
        for approval in approvals {
            if let Err(e) = self.apply_approval(approval) {
                outcome = Err(e);
                break;
            }
            applied += 1;
        }

        // whatever was applied is persisted even when a later approval is rejected
        if self.dirty {
            self.flush()?;
        }
        outcome.map(|_| applied)
    }

    fn apply_approval(&mut self, approval: &Approval) -> Result<()> {
        let key = word_key(&approval.source_id, &approval.lesson_word)?;
        let stored = StoredMatch {
            source_id: key.0.clone(),
            lesson_word: key.1.clone(),
            card_id: approval.card_id,
            confidence: approval.confidence,
            distance: approval.distance,
            matched_surface: approval.matched_surface.clone(),
            translation: approval.translation.clone(),
            approved_at: Utc::now(),
        };

        if let Some(previous) = self.matches.insert(key.clone(), stored) {
            tracing::debug!("Replaced approval {} {} (was card {})", key.0, key.1, previous.card_id);
        }
        self.unmatched.remove(&key);
        self.dirty = true;
        Ok(())
    }

    pub fn lookup(&self, source_id: &SourceId, lesson_word: &str) -> Option<&StoredMatch> {
        self.matches.get(&(source_id.clone(), normalize(lesson_word)))
    }

    pub fn is_processed(&self, source_id: &SourceId, lesson_word: &str) -> bool {
        self.lookup(source_id, lesson_word).is_some()
    }

    /// Logs a word with no acceptable candidate. Returns `true` the first
    /// time a pair is seen; repeats only bump the attempt counter.
    pub fn record_unmatched(&mut self, source_id: &SourceId, lesson_word: &str, context: &str) -> Result<bool> {
        let is_new = self.apply_unmatched(source_id, lesson_word, context)?;
        self.flush()?;
        Ok(is_new)
    }

    /// Logs every word that has letters, then flushes once. Returns how many
    /// were new.
    pub fn record_unmatched_words<'a, I>(&mut self, words: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a LessonWord>,
    {
        let mut added = 0;
        let mut outcome = Ok(());
        for word in words {
            if word.normalized_form().is_empty() {
                tracing::warn!("Not logging {:?} from {}: no letters", word.surface_form(), word.source_id());
                continue;
            }
            match self.apply_unmatched(word.source_id(), word.normalized_form(), word.context()) {
                Ok(is_new) => added += usize::from(is_new),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if self.dirty {
            self.flush()?;
        }
        outcome.map(|_| added)
    }

    fn apply_unmatched(&mut self, source_id: &SourceId, lesson_word: &str, context: &str) -> Result<bool> {
        let key = word_key(source_id, lesson_word)?;
        let is_new = match self.unmatched.get_mut(&key) {
            Some(existing) => {
                existing.attempts = existing.attempts.saturating_add(1);
                false
            }
            None => {
                let word = UnmatchedWord {
                    source_id: key.0.clone(),
                    lesson_word: key.1.clone(),
                    context: context.to_string(),
                    attempts: 1,
                };
                self.unmatched.insert(key, word);
                true
            }
        };

        self.dirty = true;
        Ok(is_new)
    }

    pub fn matches(&self) -> impl Iterator<Item = &StoredMatch> + '_ {
        self.matches.values()
    }

    pub fn unmatched_words(&self) -> impl Iterator<Item = &UnmatchedWord> + '_ {
        self.unmatched.values()
    }

    pub fn statistics(&self) -> StoreStatistics {
        let mut by_confidence: BTreeMap<Confidence, usize> =
            Confidence::ALL.iter().map(|tier| (*tier, 0)).collect();
        for stored in self.matches.values() {
            *by_confidence.entry(stored.confidence).or_insert(0) += 1;
        }

        let lessons: BTreeSet<u32> = self
            .matches
            .keys()
            .chain(self.unmatched.keys())
            .map(|(source_id, _)| source_id.lesson_number())
            .collect();

        StoreStatistics {
            lessons_processed: lessons.len(),
            total_matches: self.matches.len(),
            by_confidence,
            unmatched_count: self.unmatched.len(),
        }
    }

    /// Writes the current state if anything changed since the last write.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let file = StoreFile {
            version: STORE_VERSION,
            matches: self.matches.values().cloned().collect(),
            unmatched: self.unmatched.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        atomic_write(&self.path, json.as_bytes())
            .map_err(|source| UlpanError::StoreFlush { path: self.path.clone(), source })?;

        self.dirty = false;
        tracing::debug!("Match store flushed to {}", self.path.display());
        Ok(())
    }

    /// Flushes and releases the store, reporting any write failure.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

impl Drop for MatchStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!("Match store lost unsaved changes: {}", e);
        }
    }
}
