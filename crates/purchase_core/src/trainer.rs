//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Log-loss gradient boosting for the binary purchase label. Every
//! iteration fits a regression tree to the pseudo-residuals
//! `label - sigmoid(prediction)` and adds it to the ensemble scaled by the
//! learning rate. Training is fully deterministic: the same dataset and
//! configuration always produce a bit-identical ensemble.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, Level};

use crate::cart::{CartBuilder, TreeConfig};
use crate::config::BoostingConfig;
use crate::dataset::Dataset;
use crate::errors::{PipelineError, Result};
use crate::event::{check_features, FeatureVector};
use crate::gbdt::{logit, sigmoid, BoostedEnsemble, WeightedTree, PROBABILITY_EPSILON};

/// Lifecycle of one training run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Initialized,
    Boosting { iteration: usize },
    Trained,
    Failed,
}

/// One pass of boosting over a fixed training set.
///
/// A run moves `Initialized → Boosting → Trained`, or ends in `Failed`.
/// It cannot be restarted; build a new run instead.
pub struct TrainingRun<'a> {
    config: BoostingConfig,
    train_set: &'a Dataset,
    state: TrainingState,
}

impl<'a> TrainingRun<'a> {
    pub fn new(config: BoostingConfig, train_set: &'a Dataset) -> Self {
        Self {
            config,
            train_set,
            state: TrainingState::Initialized,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Drive the run to completion, checking `cancel` between iterations
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<BoostedEnsemble> {
        if self.state != TrainingState::Initialized {
            return Err(PipelineError::InvalidState(format!(
                "run already left the initialized state ({:?})",
                self.state
            )));
        }

        let result = self.boost(cancel);
        self.state = match &result {
            Ok(_) => TrainingState::Trained,
            Err(_) => TrainingState::Failed,
        };
        result
    }

    fn boost(&mut self, cancel: &AtomicBool) -> Result<BoostedEnsemble> {
        self.config.validate()?;
        check_trainable(self.train_set)?;

        let features: Vec<FeatureVector> = self.train_set.iter().map(|e| e.features).collect();
        let labels: Vec<f64> = self
            .train_set
            .iter()
            .map(|e| if e.label { 1.0 } else { 0.0 })
            .collect();

        let bias = logit(self.train_set.positive_rate());
        let learning_rate = self.config.learning_rate;
        let tree_config = TreeConfig::from(&self.config);
        let requested = self.config.iterations;

        info!(
            samples = features.len(),
            positives = self.train_set.positive_count(),
            bias,
            "Starting boosting"
        );

        let mut predictions = vec![bias; features.len()];
        let mut trees = Vec::with_capacity(requested);

        for iteration in 0..requested {
            if cancel.load(Ordering::Relaxed) {
                info!(completed = iteration, "Boosting cancelled");
                return Err(PipelineError::Cancelled {
                    completed: iteration,
                    requested,
                });
            }
            self.state = TrainingState::Boosting { iteration };

            let residuals: Vec<f64> = labels
                .iter()
                .zip(&predictions)
                .map(|(y, f)| y - sigmoid(*f))
                .collect();

            let tree = CartBuilder::new(&features, &residuals, tree_config.clone()).build();

            for (pred, x) in predictions.iter_mut().zip(&features) {
                *pred += learning_rate * tree.evaluate(x);
            }

            if tracing::enabled!(Level::DEBUG) {
                debug!(
                    iteration = iteration + 1,
                    nodes = tree.nodes.len(),
                    log_loss = mean_log_loss(&labels, &predictions),
                    "Boosting iteration complete"
                );
            }

            trees.push(WeightedTree {
                tree,
                weight: learning_rate,
            });
        }

        info!(trees = trees.len(), "Boosting complete");
        Ok(BoostedEnsemble::new(bias, learning_rate, trees))
    }
}

/// Reject training sets boosting cannot learn from
fn check_trainable(train_set: &Dataset) -> Result<()> {
    if train_set.is_empty() {
        return Err(PipelineError::InsufficientData(
            "training set is empty".into(),
        ));
    }
    if !train_set.has_both_classes() {
        return Err(PipelineError::InsufficientData(format!(
            "training set of {} examples contains a single class",
            train_set.len()
        )));
    }
    for example in train_set.iter() {
        check_features(&example.features)?;
    }
    Ok(())
}

fn mean_log_loss(labels: &[f64], raw_scores: &[f64]) -> f64 {
    let total: f64 = labels
        .iter()
        .zip(raw_scores)
        .map(|(y, f)| {
            let p = sigmoid(*f).clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / labels.len().max(1) as f64
}

/// GBDT trainer
pub struct GbdtTrainer {
    config: BoostingConfig,
}

impl GbdtTrainer {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Train an ensemble on an already-normalized training set
    #[instrument(skip(self, train_set), fields(samples = train_set.len()))]
    pub fn train(&self, train_set: &Dataset) -> Result<BoostedEnsemble> {
        self.train_with_cancel(train_set, &AtomicBool::new(false))
    }

    /// Train, aborting with [`PipelineError::Cancelled`] once `cancel` is set.
    /// A cancelled run never yields a partial ensemble.
    pub fn train_with_cancel(
        &self,
        train_set: &Dataset,
        cancel: &AtomicBool,
    ) -> Result<BoostedEnsemble> {
        TrainingRun::new(self.config.clone(), train_set).run(cancel)
    }
}
