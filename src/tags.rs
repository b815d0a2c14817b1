//! Hierarchical flashcard tags: `<deck>` and `<deck>::L<NN>`.
//!
//! Deck names are lower-cased when a tag is generated. Parsing is an exact,
//! case-sensitive match against that generated form.

use regex::Regex;
use serde::Serialize;

use crate::core::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LessonTags {
    pub deck_tag: String,
    pub lesson_tag: String,
}

impl LessonTags {
    pub fn to_vec(&self) -> Vec<String> {
        vec![self.deck_tag.clone(), self.lesson_tag.clone()]
    }
}

pub fn deck_tag(deck_name: &str) -> String {
    deck_name.to_lowercase()
}

/// Lesson numbers are zero-padded to two digits and widen past 99.
pub fn generate(deck_name: &str, lesson_number: u32) -> LessonTags {
    let deck_tag = deck_tag(deck_name);
    let lesson_tag = format!("{deck_tag}::L{lesson_number:02}");
    LessonTags { deck_tag, lesson_tag }
}

pub fn generate_lesson_tags(deck_name: &str, lesson_number: u32) -> Vec<String> {
    generate(deck_name, lesson_number).to_vec()
}

/// Compiled tag patterns for a single deck.
#[derive(Debug, Clone)]
pub struct TagCodec {
    deck_tag: String,
    lesson_pattern: Regex,
    legacy_pattern: Regex,
}

impl TagCodec {
    pub fn new(deck_name: &str) -> Result<Self> {
        let deck_tag = deck_tag(deck_name);
        let escaped = regex::escape(&deck_tag);
        let lesson_pattern = Regex::new(&format!(r"^{escaped}::L([0-9]{{2,}})$"))?;
        // assimil-01, assimil_01, assimil01
        let legacy_pattern = Regex::new(&format!(r"^{escaped}[-_]?([0-9]+)$"))?;
        Ok(Self { deck_tag, lesson_pattern, legacy_pattern })
    }

    pub fn deck_tag(&self) -> &str {
        &self.deck_tag
    }

    pub fn generate(&self, lesson_number: u32) -> LessonTags {
        generate(&self.deck_tag, lesson_number)
    }

    /// Lesson number of the first tag that is a lesson tag of this deck.
    pub fn parse<I, S>(&self, tags: I) -> Option<u32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter().find_map(|tag| {
            let captures = self.lesson_pattern.captures(tag.as_ref())?;
            captures.get(1)?.as_str().parse().ok()
        })
    }

    /// Rewrites an old flat lesson tag into the hierarchical form.
    pub fn migrate_legacy_tag(&self, old_tag: &str) -> Option<String> {
        let captures = self.legacy_pattern.captures(old_tag)?;
        let lesson_number: u32 = captures.get(1)?.as_str().parse().ok()?;
        Some(self.generate(lesson_number).lesson_tag)
    }

    /// True when `tags` already carry both the deck tag and this lesson's tag.
    pub fn is_tagged<I, S>(&self, tags: I, lesson_number: u32) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted = self.generate(lesson_number);
        let (mut has_deck, mut has_lesson) = (false, false);
        for tag in tags {
            has_deck |= tag.as_ref() == wanted.deck_tag;
            has_lesson |= tag.as_ref() == wanted.lesson_tag;
        }
        has_deck && has_lesson
    }
}

/// Lesson number encoded in `tags` for `deck_name`, if any.
pub fn parse<I, S>(tags: I, deck_name: &str) -> Result<Option<u32>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(TagCodec::new(deck_name)?.parse(tags))
}
