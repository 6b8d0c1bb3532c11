//! Engine configuration.
//!
//! File format (every field optional):
//! ```json
//! {
//!     "auto_complete_ratio": 0.9,
//!     "default_final_weight": 0.6,
//!     "max_score": 10.0,
//!     "certificate_code_prefix": "CERT"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};
use crate::progress::AUTO_COMPLETE_RATIO;
use crate::score::{self, DEFAULT_FINAL_WEIGHT, DEFAULT_MAX_SCORE};

/// Tunables shared by every engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Watched share of a timed lesson that completes it.
    pub auto_complete_ratio: f64,
    /// Final exam weight when neither enrollment nor policy sets one.
    pub default_final_weight: f64,
    /// Upper bound of accepted quiz and exam scores.
    pub max_score: f64,
    /// Prefix of generated certificate codes.
    pub certificate_code_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_complete_ratio: AUTO_COMPLETE_RATIO,
            default_final_weight: DEFAULT_FINAL_WEIGHT,
            max_score: DEFAULT_MAX_SCORE,
            certificate_code_prefix: "CERT".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            LearningError::InvalidFileFormat(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.auto_complete_ratio > 0.0 && self.auto_complete_ratio <= 1.0) {
            return Err(LearningError::InvalidInput(format!(
                "auto_complete_ratio must be in (0, 1], got {}",
                self.auto_complete_ratio
            )));
        }
        score::validate_final_weight(self.default_final_weight)?;
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(LearningError::InvalidInput(format!(
                "max_score must be positive, got {}",
                self.max_score
            )));
        }
        let prefix = &self.certificate_code_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LearningError::InvalidInput(format!(
                "certificate_code_prefix must be non-empty ASCII alphanumerics, got {prefix:?}"
            )));
        }
        Ok(())
    }
}
