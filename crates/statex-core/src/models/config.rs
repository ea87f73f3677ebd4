//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatexError};

/// Main configuration for statex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatexConfig {
    /// Statement parsing configuration.
    pub parser: ParserConfig,

    /// Post-hoc validation configuration.
    pub validation: ValidationConfig,

    /// Output formatting configuration.
    pub output: OutputConfig,
}

/// Statement parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Require a date on every generic transaction line.
    pub strict_mode: bool,

    /// Echo raw OCR text back in results.
    pub include_raw_text: bool,

    /// Language assumed when vocabulary counts are inconclusive.
    pub default_language: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_raw_text: false,
            default_language: "en".to_string(),
        }
    }
}

/// Validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Transactions below this confidence count as low-confidence.
    pub low_confidence_threshold: u8,

    /// Minimum score for a result to be considered valid.
    pub min_valid_score: i32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 60,
            min_valid_score: 60,
        }
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl StatexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot honour.
    pub fn check(&self) -> Result<()> {
        if !matches!(self.parser.default_language.as_str(), "en" | "fr") {
            return Err(StatexError::Config(format!(
                "unsupported default_language: {}",
                self.parser.default_language
            )));
        }
        if self.validation.low_confidence_threshold > 100 {
            return Err(StatexError::Config(format!(
                "low_confidence_threshold must be at most 100, got {}",
                self.validation.low_confidence_threshold
            )));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StatexConfig =
            serde_json::from_str(r#"{"parser":{"strict_mode":true}}"#).unwrap();
        assert!(config.parser.strict_mode);
        assert_eq!(config.parser.default_language, "en");
        assert_eq!(config.validation.low_confidence_threshold, 60);
    }

    #[test]
    fn test_check_rejects_unknown_language() {
        let mut config = StatexConfig::default();
        assert!(config.check().is_ok());

        config.parser.default_language = "de".to_string();
        assert!(matches!(config.check(), Err(StatexError::Config(_))));
    }
}
