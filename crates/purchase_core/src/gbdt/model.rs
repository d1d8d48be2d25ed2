//! Boosted ensemble with logit-scale scoring
//!
//! The raw score of an example is `bias + Σ weight_k · tree_k(x)`; the
//! purchase probability is the logistic sigmoid of that raw score.

use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use super::{sigmoid, DECISION_THRESHOLD};
use crate::errors::{PipelineError, Result};
use crate::event::FEATURE_COUNT;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};

/// Current ensemble format version
pub const FORMAT_VERSION: u32 = 1;

/// A tree and the weight applied to its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTree {
    pub tree: DecisionTree,
    pub weight: f64,
}

/// Additive ensemble of regression trees on the logit scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedEnsemble {
    /// Ensemble format version
    pub version: u32,

    /// Initial raw score (logit of the training base rate)
    pub bias: f64,

    /// Shrinkage used during training
    pub learning_rate: f64,

    /// Width of the feature vectors the trees index into
    pub feature_count: usize,

    /// Trees in boosting order
    pub trees: Vec<WeightedTree>,
}

impl BoostedEnsemble {
    pub fn new(bias: f64, learning_rate: f64, trees: Vec<WeightedTree>) -> Self {
        Self {
            version: FORMAT_VERSION,
            bias,
            learning_rate,
            feature_count: FEATURE_COUNT,
            trees,
        }
    }

    /// Raw additive score on the logit scale
    pub fn raw_score(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.bias, |acc, t| acc + t.weight * t.tree.evaluate(features))
    }

    /// Probability that the example is a purchase
    pub fn probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.raw_score(features))
    }

    /// Predicted label (`probability >= 0.5`)
    pub fn predict(&self, features: &[f64]) -> bool {
        self.probability(features) >= DECISION_THRESHOLD
    }

    /// Get number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Validate ensemble structure
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(PipelineError::Serialization(format!(
                "Unsupported ensemble version: {}",
                self.version
            )));
        }
        if self.feature_count != FEATURE_COUNT {
            return Err(PipelineError::Serialization(format!(
                "Ensemble expects {} features, pipeline produces {}",
                self.feature_count, FEATURE_COUNT
            )));
        }
        if !self.bias.is_finite() || !self.learning_rate.is_finite() {
            return Err(PipelineError::Serialization(
                "Ensemble bias and learning rate must be finite".into(),
            ));
        }
        for (i, weighted) in self.trees.iter().enumerate() {
            weighted.tree.validate().map_err(|e| {
                PipelineError::Serialization(format!("Tree {} validation failed: {}", i, e))
            })?;
        }
        Ok(())
    }

    /// Serialize to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String> {
        to_canonical_json(self)
    }

    /// Blake3 hash of the canonical JSON representation
    pub fn hash_hex(&self) -> Result<String> {
        hash_canonical_hex(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_ensemble() -> BoostedEnsemble {
        let tree1 = DecisionTree::new(vec![
            Node::internal(0, 0.5, 1, 2),
            Node::leaf(1.0),
            Node::leaf(2.0),
        ]);
        let tree2 = DecisionTree::new(vec![
            Node::internal(1, 0.3, 1, 2),
            Node::leaf(-0.5),
            Node::leaf(0.5),
        ]);

        BoostedEnsemble::new(
            0.25,
            0.5,
            vec![
                WeightedTree { tree: tree1, weight: 0.5 },
                WeightedTree { tree: tree2, weight: 0.5 },
            ],
        )
    }

    #[test]
    fn test_raw_score() {
        let ensemble = create_test_ensemble();
        // 0.25 + 0.5 * 1.0 + 0.5 * -0.5
        assert_eq!(ensemble.raw_score(&[0.3, 0.2, 0.0, 0.0]), 0.5);
        // 0.25 + 0.5 * 2.0 + 0.5 * 0.5
        assert_eq!(ensemble.raw_score(&[0.6, 0.4, 0.0, 0.0]), 1.5);
    }

    #[test]
    fn test_predict_threshold() {
        let empty = BoostedEnsemble::new(0.0, 0.1, vec![]);
        // sigmoid(0) == 0.5 counts as a purchase
        assert_eq!(empty.probability(&[0.0; FEATURE_COUNT]), 0.5);
        assert!(empty.predict(&[0.0; FEATURE_COUNT]));

        let negative = BoostedEnsemble::new(-0.01, 0.1, vec![]);
        assert!(!negative.predict(&[0.0; FEATURE_COUNT]));
    }

    #[test]
    fn test_validation() {
        assert!(create_test_ensemble().validate().is_ok());

        let mut bad = create_test_ensemble();
        bad.version = 999;
        assert!(bad.validate().is_err());

        let mut bad = create_test_ensemble();
        bad.bias = f64::NAN;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_hash_deterministic() {
        let h1 = create_test_ensemble().hash_hex().unwrap();
        let h2 = create_test_ensemble().hash_hex().unwrap();
        assert_eq!(h1, h2);

        let mut changed = create_test_ensemble();
        changed.bias = 0.26;
        assert_ne!(h1, changed.hash_hex().unwrap());
    }

    #[test]
    fn test_canonical_json_roundtrip() {
        let original = create_test_ensemble();
        let json = original.to_canonical_json().unwrap();
        let restored: BoostedEnsemble = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
        assert_eq!(original.hash_hex().unwrap(), restored.hash_hex().unwrap());
    }
}
