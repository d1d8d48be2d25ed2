//! Pipeline configuration
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below. Values are range-checked by [`PipelineConfig::validate`] before a
//! run starts.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::errors::{PipelineError, Result};

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Train/test partitioning
    pub split: SplitConfig,
    /// Tree boosting
    pub boosting: BoostingConfig,
    /// Evaluation reporting
    pub evaluation: EvaluationConfig,
}

/// Train/test split configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of examples held out for testing, in (0, 1)
    pub test_fraction: f64,
    /// Seed for the index permutation
    pub seed: i64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Gradient boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of boosting iterations (trees)
    pub iterations: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Maximum depth of each tree (0 grows single-leaf trees)
    pub max_depth: usize,
    /// Minimum examples in each child of a split
    pub min_leaf_size: usize,
    /// Upper bound on candidate thresholds per feature and node
    pub max_bins: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            learning_rate: 0.2,
            max_depth: 3,
            min_leaf_size: 10,
            max_bins: 255,
        }
    }
}

impl BoostingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PipelineError::InvalidConfig(
                "boosting.iterations must be at least 1".into(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "boosting.learning_rate must lie in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.min_leaf_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "boosting.min_leaf_size must be at least 1".into(),
            ));
        }
        if self.max_bins < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "boosting.max_bins must be at least 2, got {}",
                self.max_bins
            )));
        }
        Ok(())
    }
}

/// Evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Accuracy at or above which the model is reported as usable
    pub accuracy_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: 0.7,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| PipelineError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Serialization(e.to_string()))
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        let fraction = self.split.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PipelineError::InvalidFraction(fraction));
        }

        self.boosting.validate()?;

        let threshold = self.evaluation.accuracy_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "evaluation.accuracy_threshold must lie in [0, 1], got {}",
                threshold
            )));
        }

        Ok(())
    }
}
