use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use strsim::levenshtein;

use crate::core::{
    Result,
    UlpanError,
};

/// Confidence tier of a match, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Exact,
    High,
    Fuzzy,
    Low,
}

impl Confidence {
    pub const ALL: [Confidence; 4] = [Confidence::Exact, Confidence::High, Confidence::Fuzzy, Confidence::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Exact => "exact",
            Confidence::High => "high",
            Confidence::Fuzzy => "fuzzy",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive upper distance bound of each tier; anything above `fuzzy_max`
/// is [`Confidence::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub exact_max: usize,
    pub high_max: usize,
    pub fuzzy_max: usize,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self { exact_max: 0, high_max: 2, fuzzy_max: 5 }
    }
}

impl ConfidenceThresholds {
    /// Tiers must be nested, otherwise a larger distance could land in a
    /// better tier.
    pub fn validate(&self) -> Result<()> {
        if self.exact_max <= self.high_max && self.high_max <= self.fuzzy_max {
            Ok(())
        } else {
            Err(UlpanError::InvalidConfig(format!(
                "confidence thresholds must satisfy exact_max <= high_max <= fuzzy_max, got {} / {} / {}",
                self.exact_max, self.high_max, self.fuzzy_max
            )))
        }
    }

    pub fn classify(&self, distance: usize) -> Confidence {
        if distance <= self.exact_max {
            Confidence::Exact
        } else if distance <= self.high_max {
            Confidence::High
        } else if distance <= self.fuzzy_max {
            Confidence::Fuzzy
        } else {
            Confidence::Low
        }
    }
}

/// Classification with the default thresholds.
pub fn classify(distance: usize) -> Confidence {
    ConfidenceThresholds::default().classify(distance)
}

/// Distance between two already-normalized words. Lower is closer; identical
/// words score 0.
pub trait Scorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> usize;

    /// True when `score(a, b) >= |len(a) - len(b)|` (in chars) always holds,
    /// which lets the selector skip entries by length alone.
    fn bounded_by_length(&self) -> bool {
        false
    }
}

/// Unit-cost insert/delete/substitute distance over chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Scorer for Levenshtein {
    fn score(&self, a: &str, b: &str) -> usize {
        levenshtein(a, b)
    }

    fn bounded_by_length(&self) -> bool {
        true
    }
}

/// Edit distance between two normalized words. Callers normalize first.
pub fn distance(a: &str, b: &str) -> usize {
    Levenshtein.score(a, b)
}
