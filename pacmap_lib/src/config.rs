//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) is a
//! valid configuration. Environment variables override the file for the
//! fuzzy-match thresholds.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::party::DEFAULT_THRESHOLD;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(String),
    #[error("{field} must be between 0 and 100, got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f64 },
}

/// File names of the five bulk tables inside the input directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InputFiles {
    pub individuals: String,
    pub committees: String,
    pub candidates: String,
    pub transfers: String,
    pub expenditures: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            individuals: "itcont.txt".to_string(),
            committees: "cm.txt".to_string(),
            candidates: "cn.txt".to_string(),
            transfers: "itoth.txt".to_string(),
            expenditures: "oppexp.txt".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub files: InputFiles,
    /// Minimum token-sort score for a candidate committee match.
    pub candidate_threshold: f64,
    /// Minimum token-sort score for the committee registry fallback.
    pub committee_threshold: f64,
    /// Code table YAML replacing the embedded defaults.
    pub codes_path: Option<PathBuf>,
    /// Name exception TOML replacing the embedded defaults.
    pub exceptions_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            files: InputFiles::default(),
            candidate_threshold: DEFAULT_THRESHOLD,
            committee_threshold: DEFAULT_THRESHOLD,
            codes_path: None,
            exceptions_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Apply `PACMAP_CANDIDATE_THRESHOLD` and `PACMAP_COMMITTEE_THRESHOLD`.
    /// Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        self.candidate_threshold = env_f64("PACMAP_CANDIDATE_THRESHOLD", self.candidate_threshold);
        self.committee_threshold = env_f64("PACMAP_COMMITTEE_THRESHOLD", self.committee_threshold);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("candidate_threshold", self.candidate_threshold)?;
        check_threshold("committee_threshold", self.committee_threshold)?;
        Ok(())
    }
}

fn check_threshold(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { field, value });
    }
    Ok(())
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.files.individuals, "itcont.txt");
        assert_eq!(config.files.expenditures, "oppexp.txt");
        assert_eq!(config.candidate_threshold, 95.0);
        assert_eq!(config.committee_threshold, 95.0);
        assert!(config.codes_path.is_none());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(PipelineConfig::from_toml("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = PipelineConfig::from_toml(
            r#"
committee_threshold = 90.0
codes_path = "codes.yml"

[files]
individuals = "itcont_2020.txt"
"#,
        )
        .unwrap();
        assert_eq!(config.committee_threshold, 90.0);
        assert_eq!(config.candidate_threshold, 95.0);
        assert_eq!(config.files.individuals, "itcont_2020.txt");
        assert_eq!(config.files.committees, "cm.txt");
        assert_eq!(config.codes_path, Some(PathBuf::from("codes.yml")));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let result = PipelineConfig::from_toml("candidate_threshold = 101.0");
        assert!(matches!(
            result,
            Err(ConfigError::ThresholdOutOfRange {
                field: "candidate_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            PipelineConfig::from_toml("candidate_threshold = \"high\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_env_f64_fallback() {
        assert_eq!(env_f64("PACMAP_TEST_UNSET_VARIABLE", 42.0), 42.0);
    }
}
