//! Min-max feature normalization
//!
//! Parameters are fitted on the training split only and then reused,
//! unchanged, for the test split and for live inference.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::errors::{PipelineError, Result};
use crate::event::{FeatureVector, LabeledExample, FEATURE_COUNT, FEATURE_NAMES};

/// Observed range of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// Range collapses to a single value
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Scale `value` into [0, 1]; a degenerate range maps everything to 0
    pub fn scale(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Per-feature scaling parameters fitted on a training set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub ranges: [FeatureRange; FEATURE_COUNT],
}

impl NormalizationParams {
    /// Normalize a single feature vector
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in features.iter().enumerate() {
            out[i] = self.ranges[i].scale(*value);
        }
        out
    }

    /// Normalize one example, keeping its label
    pub fn transform_example(&self, example: &LabeledExample) -> LabeledExample {
        LabeledExample::new(example.label, self.transform(&example.features))
    }

    /// Normalize every example of a dataset, preserving order
    pub fn transform_dataset(&self, dataset: &Dataset) -> Dataset {
        dataset.iter().map(|e| self.transform_example(e)).collect()
    }
}

/// Fits [`NormalizationParams`]
pub struct Normalizer;

impl Normalizer {
    /// Scan the training set once and record per-feature min/max
    pub fn fit(train_set: &Dataset) -> Result<NormalizationParams> {
        let stats = train_set.feature_stats().ok_or_else(|| {
            PipelineError::EmptyDataset("cannot fit normalization on an empty training set".into())
        })?;

        let mut ranges = [FeatureRange { min: 0.0, max: 0.0 }; FEATURE_COUNT];
        for (i, (min, max)) in stats.into_iter().enumerate() {
            ranges[i] = FeatureRange { min, max };
            if ranges[i].is_degenerate() {
                warn!(feature = FEATURE_NAMES[i], value = min, "Degenerate feature range, feature normalizes to 0");
            } else {
                debug!(feature = FEATURE_NAMES[i], min, max, "Fitted feature range");
            }
        }

        Ok(NormalizationParams { ranges })
    }
}
