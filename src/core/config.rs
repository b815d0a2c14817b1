use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

use super::{
    Result,
    UlpanError,
};
use crate::{
    matching::ConfidenceThresholds,
    persistence::{
        get_data_file_path,
        load_json,
        save_json,
    },
};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub max_distance: usize,
    pub max_candidates: usize,
    pub thresholds: ConfidenceThresholds,
    /// Normalized words shorter than this are treated as particles and skipped.
    pub min_word_length: usize,
    pub first_occurrence_only: bool,
    pub deck_name: String,
    pub parallel: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_distance: 5,
            max_candidates: 3,
            thresholds: ConfidenceThresholds::default(),
            min_word_length: 2,
            first_occurrence_only: true,
            deck_name: "assimil".to_string(),
            parallel: true,
        }
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 {
            return Err(UlpanError::InvalidConfig("max_candidates must be at least 1".to_string()));
        }
        if self.deck_name.trim().is_empty() {
            return Err(UlpanError::InvalidConfig("deck_name must not be empty".to_string()));
        }
        self.thresholds.validate()
    }

    /// Reads and validates the config at `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_json(path)?;
        config.validate()?;
        tracing::debug!("Matching config: {:?}", config);
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&get_data_file_path(CONFIG_FILE))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        save_json(self, path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MatchingConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, MatchingConfig::default());
        assert_eq!(config.max_distance, 5);
        assert_eq!(config.max_candidates, 3);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"max_candidates": 5, "deck_name": "Hebrew Course"}"#).unwrap();

        let config = MatchingConfig::load(&path).unwrap();
        assert_eq!(config.max_candidates, 5);
        assert_eq!(config.deck_name, "Hebrew Course");
        assert_eq!(config.max_distance, 5);
        assert!(config.first_occurrence_only);
    }

    #[test]
    fn rejects_invalid_settings() {
        let zero = MatchingConfig { max_candidates: 0, ..Default::default() };
        assert!(matches!(zero.validate(), Err(UlpanError::InvalidConfig(_))));

        let blank = MatchingConfig { deck_name: "  ".to_string(), ..Default::default() };
        assert!(matches!(blank.validate(), Err(UlpanError::InvalidConfig(_))));

        let inverted = MatchingConfig {
            thresholds: ConfidenceThresholds { exact_max: 0, high_max: 6, fuzzy_max: 3 },
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(UlpanError::InvalidConfig(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = MatchingConfig { parallel: false, min_word_length: 3, ..Default::default() };

        config.save(&path).unwrap();
        assert_eq!(MatchingConfig::load(&path).unwrap(), config);
    }
}
