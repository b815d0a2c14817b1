use std::{
    fmt,
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::UlpanError;
use crate::segmentation::normalizer::normalize;

/// Lesson (and optional section) a piece of course content came from,
/// written `L001` or `L001.S01`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId {
    lesson: u32,
    section: Option<String>,
}

impl SourceId {
    pub fn lesson(lesson: u32) -> Self {
        Self { lesson, section: None }
    }

    pub fn section(lesson: u32, section: impl Into<String>) -> Self {
        Self { lesson, section: Some(section.into()) }
    }

    pub fn lesson_number(&self) -> u32 {
        self.lesson
    }

    pub fn section_name(&self) -> Option<&str> {
        self.section.as_deref()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => write!(f, "L{:03}.{}", self.lesson, section),
            None => write!(f, "L{:03}", self.lesson),
        }
    }
}

impl FromStr for SourceId {
    type Err = UlpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UlpanError::InvalidSourceId(s.to_string());

        let body = s.trim().strip_prefix('L').ok_or_else(invalid)?;
        let (lesson, section) = match body.split_once('.') {
            Some((lesson, section)) => (lesson, Some(section)),
            None => (body, None),
        };

        if lesson.is_empty() || !lesson.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let lesson: u32 = lesson.parse().map_err(|_| invalid())?;

        match section {
            Some(section) if section.is_empty() || !section.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Err(invalid())
            }
            Some(section) => Ok(Self::section(lesson, section)),
            None => Ok(Self::lesson(lesson)),
        }
    }
}

impl TryFrom<String> for SourceId {
    type Error = UlpanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.to_string()
    }
}

/// Flashcard identifier as handed out by the flashcard application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LessonWordRecord {
    surface_form: String,
    source_id: SourceId,
    #[serde(default)]
    context: String,
}

impl From<LessonWordRecord> for LessonWord {
    fn from(record: LessonWordRecord) -> Self {
        LessonWord::new(record.surface_form, record.source_id, record.context)
    }
}

/// One word-class token pulled out of lesson content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LessonWordRecord")]
pub struct LessonWord {
    surface_form: String,
    normalized_form: String,
    source_id: SourceId,
    context: String,
}

impl LessonWord {
    pub fn new(surface_form: impl Into<String>, source_id: SourceId, context: impl Into<String>) -> Self {
        let surface_form = surface_form.into();
        let normalized_form = normalize(&surface_form);
        Self { surface_form, normalized_form, source_id, context: context.into() }
    }

    pub fn surface_form(&self) -> &str {
        &self.surface_form
    }

    pub fn normalized_form(&self) -> &str {
        &self.normalized_form
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Lesson content as delivered by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSource {
    pub source_id: SourceId,
    pub phrases: Vec<String>,
}

impl LessonSource {
    pub fn new(source_id: SourceId, phrases: Vec<String>) -> Self {
        Self { source_id, phrases }
    }
}

/// A source the collaborators could not deliver. Kept in the report so one
/// bad lesson does not sink the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self { source: source.into(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_round_trips_through_text() {
        let id: SourceId = "L001.S02".parse().unwrap();
        assert_eq!(id.lesson_number(), 1);
        assert_eq!(id.section_name(), Some("S02"));
        assert_eq!(id.to_string(), "L001.S02");

        let plain: SourceId = "L42".parse().unwrap();
        assert_eq!(plain, SourceId::lesson(42));
        assert_eq!(plain.to_string(), "L042");
    }

    #[test]
    fn rejects_malformed_source_ids() {
        for bad in ["", "001", "L", "Lx1", "L1.", "L1.S 1", "L-1"] {
            assert!(bad.parse::<SourceId>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn source_ids_order_by_lesson_then_section() {
        let mut ids = vec![SourceId::section(2, "S01"), SourceId::lesson(10), SourceId::lesson(2)];
        ids.sort();
        assert_eq!(ids, vec![SourceId::lesson(2), SourceId::section(2, "S01"), SourceId::lesson(10)]);
    }

    #[test]
    fn lesson_word_derives_normalized_form() {
        let word = LessonWord::new("בּוֹקֶר", SourceId::lesson(1), "בּוֹקֶר טוֹב");
        assert_eq!(word.normalized_form(), "בוקר");

        let parsed: LessonWord =
            serde_json::from_str(r#"{"surface_form":"טוֹב","source_id":"L003.N2"}"#).unwrap();
        assert_eq!(parsed.normalized_form(), "טוב");
        assert_eq!(parsed.source_id(), &SourceId::section(3, "N2"));
        assert_eq!(parsed.context(), "");
    }
}
