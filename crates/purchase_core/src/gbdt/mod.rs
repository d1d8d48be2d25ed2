//! Gradient boosted decision trees for binary purchase classification
//!
//! - Trees are arena-indexed (`tree::DecisionTree`), node 0 is the root
//! - Routing is `feature <= threshold` goes left
//! - The ensemble (`model::BoostedEnsemble`) scores on the logit scale and
//!   converts to a probability with the logistic sigmoid
//! - Canonical JSON + blake3 identify a trained ensemble byte for byte

pub mod model;
pub mod tree;

pub use model::{BoostedEnsemble, WeightedTree, FORMAT_VERSION};
pub use tree::{DecisionTree, Node};

/// Probability at or above which an example is predicted as a purchase
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Probabilities are kept this far away from 0 and 1 before taking a logit
pub const PROBABILITY_EPSILON: f64 = 1e-7;

/// Logistic sigmoid
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Log-odds of `p`, clamped so the result stays finite
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
    (p / (1.0 - p)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_values() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_logit_inverts_sigmoid() {
        for p in [0.1, 0.25, 0.5, 0.9] {
            assert!((sigmoid(logit(p)) - p).abs() < 1e-12);
        }
    }

    #[test]
    fn test_logit_is_clamped() {
        assert!(logit(0.0).is_finite());
        assert!(logit(1.0).is_finite());
        assert!(logit(0.0) < -15.0);
        assert!(logit(1.0) > 15.0);
    }
}
