//! Binary classification metrics for a trained ensemble
//!
//! Scores are probabilities from [`BoostedEnsemble::probability`]; an
//! example is predicted positive when its score is at least 0.5.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

use crate::dataset::Dataset;
use crate::errors::{PipelineError, Result};
use crate::gbdt::{BoostedEnsemble, DECISION_THRESHOLD};

/// Scores are clamped this far from 0 and 1 before taking logarithms
const LOG_LOSS_EPSILON: f64 = 1e-15;

/// Counts of predicted vs. actual labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Positive precision; 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Positive recall; 0 when there are no positives
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall; 0 when both are 0
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Metrics of one (ensemble, test set) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub auc: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    pub log_loss: f64,
    pub confusion: ConfusionMatrix,
}

/// Qualitative reading of the accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Usable,
    NeedsImprovement,
}

impl Verdict {
    pub fn from_accuracy(accuracy: f64, threshold: f64) -> Self {
        if accuracy >= threshold {
            Verdict::Usable
        } else {
            Verdict::NeedsImprovement
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Usable => write!(f, "The model performs well and can be used for predictions."),
            Verdict::NeedsImprovement => write!(
                f,
                "The model may not be accurate enough. Consider improving it."
            ),
        }
    }
}

/// Score every example of a normalized test set and compute the metrics
#[instrument(skip(ensemble, test_set), fields(samples = test_set.len()))]
pub fn evaluate(ensemble: &BoostedEnsemble, test_set: &Dataset) -> Result<EvaluationMetrics> {
    if test_set.is_empty() {
        return Err(PipelineError::EmptyDataset(
            "cannot evaluate on an empty test set".into(),
        ));
    }

    let scores: Vec<f64> = test_set
        .examples
        .par_iter()
        .map(|e| ensemble.probability(&e.features))
        .collect();
    let labels: Vec<bool> = test_set.iter().map(|e| e.label).collect();

    let metrics = metrics_from_scores(&scores, &labels);
    info!(
        accuracy = metrics.accuracy,
        auc = metrics.auc,
        f1 = metrics.f1,
        "Evaluation complete"
    );
    Ok(metrics)
}

/// Metrics from probability scores and true labels of equal length
pub fn metrics_from_scores(scores: &[f64], labels: &[bool]) -> EvaluationMetrics {
    debug_assert_eq!(scores.len(), labels.len());

    let mut confusion = ConfusionMatrix::default();
    let mut loss = 0.0;
    for (&score, &label) in scores.iter().zip(labels) {
        confusion.record(score >= DECISION_THRESHOLD, label);

        let p = score.clamp(LOG_LOSS_EPSILON, 1.0 - LOG_LOSS_EPSILON);
        loss -= if label { p.ln() } else { (1.0 - p).ln() };
    }

    EvaluationMetrics {
        accuracy: confusion.accuracy(),
        auc: auc(scores, labels),
        f1: confusion.f1(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        log_loss: loss / scores.len().max(1) as f64,
        confusion,
    }
}

/// Area under the ROC curve in Mann-Whitney form.
///
/// Equals the probability that a random positive outscores a random
/// negative, with ties counting one half. Exactly 0.5 when only one class
/// is present.
pub fn auc(scores: &[f64], labels: &[bool]) -> f64 {
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;

    if n_pos == 0 || n_neg == 0 {
        warn!(n_pos, n_neg, "Single-class test set, AUC reported as 0.5");
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Sum of 1-based ranks of the positives, ties sharing their average rank
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }

        let average_rank = (start + 1 + end) as f64 / 2.0;
        let positives_in_group = order[start..end].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += average_rank * positives_in_group as f64;

        start = end;
    }

    let n_pos_f = n_pos as f64;
    let u = positive_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0;
    u / (n_pos_f * n_neg as f64)
}
