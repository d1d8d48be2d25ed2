//! Stateless single-record prediction
//!
//! Reuses the training-time normalization parameters and the trained
//! ensemble without mutating either, so one engine (or many) can serve
//! predictions from any number of threads.

use crate::errors::Result;
use crate::event::{check_features, extract_features, FeatureVector, RawEvent};
use crate::gbdt::{BoostedEnsemble, DECISION_THRESHOLD};
use crate::normalize::NormalizationParams;

/// Predict whether `event` is a purchase. Its `event_type` is ignored.
pub fn predict(
    event: &RawEvent,
    params: &NormalizationParams,
    ensemble: &BoostedEnsemble,
) -> Result<bool> {
    InferenceEngine::new(params, ensemble).predict(event)
}

/// Borrowed view over fitted parameters and a trained ensemble
#[derive(Debug, Clone, Copy)]
pub struct InferenceEngine<'a> {
    params: &'a NormalizationParams,
    ensemble: &'a BoostedEnsemble,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(params: &'a NormalizationParams, ensemble: &'a BoostedEnsemble) -> Self {
        Self { params, ensemble }
    }

    /// Purchase probability for a raw event
    pub fn probability(&self, event: &RawEvent) -> Result<f64> {
        let features = extract_features(event)?;
        self.probability_features(&features)
    }

    /// Purchase probability for an un-normalized feature vector
    pub fn probability_features(&self, features: &FeatureVector) -> Result<f64> {
        check_features(features)?;
        let normalized = self.params.transform(features);
        Ok(self.ensemble.probability(&normalized))
    }

    pub fn predict(&self, event: &RawEvent) -> Result<bool> {
        Ok(self.probability(event)? >= DECISION_THRESHOLD)
    }

    /// Predict from `[product_id, category_id, price, user_id]`
    pub fn predict_features(&self, features: &FeatureVector) -> Result<bool> {
        Ok(self.probability_features(features)? >= DECISION_THRESHOLD)
    }
}
