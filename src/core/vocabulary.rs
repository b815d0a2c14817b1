use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashMap,
    },
    sync::LazyLock,
};

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use super::models::CardId;
use crate::segmentation::normalizer::normalize;

/// Shape of a vocabulary row as loaded from a collection snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyRecord {
    pub surface_form: String,
    #[serde(default)]
    pub translation: String,
    pub card_id: CardId,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl From<VocabularyRecord> for VocabularyEntry {
    fn from(record: VocabularyRecord) -> Self {
        VocabularyEntry::new(record.surface_form, record.translation, record.card_id)
            .with_tags(record.tags)
    }
}

/// A word that already has a flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VocabularyRecord")]
pub struct VocabularyEntry {
    surface_form: String,
    normalized_form: String,
    translation: String,
    card_id: CardId,
    tags: BTreeSet<String>,
}

impl VocabularyEntry {
    pub fn new(surface_form: impl Into<String>, translation: impl Into<String>, card_id: CardId) -> Self {
        let surface_form = surface_form.into();
        let normalized_form = normalize(&surface_form);
        Self { surface_form, normalized_form, translation: translation.into(), card_id, tags: BTreeSet::new() }
    }

    /// Builds an entry from raw flashcard field values, which may carry HTML
    /// markup and stray whitespace.
    pub fn from_raw_field(surface_field: &str, translation_field: &str, card_id: CardId) -> Self {
        Self::new(clean_field_text(surface_field), clean_field_text(translation_field), card_id)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn surface_form(&self) -> &str {
        &self.surface_form
    }

    pub fn normalized_form(&self) -> &str {
        &self.normalized_form
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"));

/// Removes `<...>` markup and collapses whitespace runs.
pub fn clean_field_text(text: &str) -> String {
    MARKUP.replace_all(text, "").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub distinct_forms: usize,
}

/// Vocabulary keyed by normalized form. Distinct surface forms that normalize
/// to the same string are all kept.
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    entries: Vec<VocabularyEntry>,
    by_form: HashMap<String, Vec<usize>>,
    // normalized length (chars) -> entry positions
    by_length: BTreeMap<usize, Vec<usize>>,
}

impl VocabularyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Entries with nothing left after normalization cannot
    /// match anything and are rejected.
    pub fn insert(&mut self, entry: VocabularyEntry) -> bool {
        if entry.normalized_form.is_empty() {
            return false;
        }

        let position = self.entries.len();
        self.by_form.entry(entry.normalized_form.clone()).or_default().push(position);
        self.by_length.entry(entry.normalized_form.chars().count()).or_default().push(position);
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    /// Every entry normalizing exactly to `normalized_form`.
    pub fn get(&self, normalized_form: &str) -> impl Iterator<Item = &VocabularyEntry> + '_ {
        self.by_form
            .get(normalized_form)
            .into_iter()
            .flatten()
            .map(move |&position| &self.entries[position])
    }

    /// Entries whose normalized length is within `max_difference` of `length`.
    /// Edit distance is never below the length difference, so nothing within
    /// `max_difference` edits is left out.
    pub fn within_length(&self, length: usize, max_difference: usize) -> impl Iterator<Item = &VocabularyEntry> + '_ {
        let low = length.saturating_sub(max_difference);
        let high = length.saturating_add(max_difference);
        self.by_length
            .range(low..=high)
            .flat_map(|(_, positions)| positions.iter())
            .map(move |&position| &self.entries[position])
    }

    pub fn find_card(&self, card_id: CardId) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|entry| entry.card_id == card_id)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats { entries: self.entries.len(), distinct_forms: self.by_form.len() }
    }
}

impl FromIterator<VocabularyEntry> for VocabularyIndex {
    fn from_iter<T: IntoIterator<Item = VocabularyEntry>>(iter: T) -> Self {
        let mut index = VocabularyIndex::new();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}

impl Extend<VocabularyEntry> for VocabularyIndex {
    fn extend<T: IntoIterator<Item = VocabularyEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(surface: &str, card: u64) -> VocabularyEntry {
        VocabularyEntry::new(surface, "", CardId(card))
    }

    #[test]
    fn colliding_forms_are_kept_separately() {
        let index: VocabularyIndex =
            vec![entry("בֹּקֶר", 1), entry("בּוֹקֶר", 2), entry("בָּקָר", 3)].into_iter().collect();

        let mut cards: Vec<u64> = index.get("בוקר").map(|e| e.card_id().0).collect();
        cards.sort();
        assert_eq!(cards, vec![2]);
        assert_eq!(index.get("בקר").count(), 2);
        assert_eq!(index.stats(), IndexStats { entries: 3, distinct_forms: 2 });
    }

    #[test]
    fn rejects_entries_without_letters() {
        let mut index = VocabularyIndex::new();
        assert!(!index.insert(entry("hello", 1)));
        assert!(index.insert(entry("שלום", 2)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn length_window_is_inclusive() {
        let index: VocabularyIndex =
            vec![entry("אב", 1), entry("אבג", 2), entry("אבגדה", 3), entry("אבגדהוזח", 4)].into_iter().collect();

        let mut cards: Vec<u64> = index.within_length(4, 1).map(|e| e.card_id().0).collect();
        cards.sort();
        assert_eq!(cards, vec![2, 3]);
        assert_eq!(index.within_length(0, 2).count(), 1);
    }

    #[test]
    fn cleans_markup_from_raw_fields() {
        let entry = VocabularyEntry::from_raw_field("<b>שָׁלוֹם</b> ", " peace <br>  hello ", CardId(9));
        assert_eq!(entry.surface_form(), "שָׁלוֹם");
        assert_eq!(entry.normalized_form(), "שלום");
        assert_eq!(entry.translation(), "peace hello");

        // markup inside a word does not split it
        let split = VocabularyEntry::from_raw_field("שָׁ<b>לוֹם</b>", "", CardId(10));
        assert_eq!(split.surface_form(), "שָׁלוֹם");
        assert_eq!(clean_field_text("a < b"), "a < b");
    }

    #[test]
    fn deserializes_from_a_record() {
        let entry: VocabularyEntry = serde_json::from_str(
            r#"{"surface_form":"תּוֹדָה","translation":"thanks","card_id":77,"tags":["assimil"]}"#,
        )
        .unwrap();
        assert_eq!(entry.normalized_form(), "תודה");
        assert_eq!(entry.card_id(), CardId(77));
        assert!(entry.has_tag("assimil"));
    }
}
