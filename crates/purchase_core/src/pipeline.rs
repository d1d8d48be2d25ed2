//! End-to-end training pipeline
//!
//! raw events → labeled dataset → train/test split → normalization fitted
//! on train → boosting on train → evaluation on test. Any stage error
//! aborts the run; no partially trained model is ever returned.

use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::errors::Result;
use crate::evaluate::{evaluate, EvaluationMetrics, Verdict};
use crate::event::RawEvent;
use crate::gbdt::BoostedEnsemble;
use crate::inference::InferenceEngine;
use crate::normalize::{NormalizationParams, Normalizer};
use crate::split::split;
use crate::trainer::GbdtTrainer;

/// Artifacts of a completed pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub params: NormalizationParams,
    pub ensemble: BoostedEnsemble,
    pub metrics: EvaluationMetrics,
    pub train_size: usize,
    pub test_size: usize,
}

impl TrainedPipeline {
    /// Inference engine over this run's parameters and ensemble
    pub fn engine(&self) -> InferenceEngine<'_> {
        InferenceEngine::new(&self.params, &self.ensemble)
    }

    pub fn verdict(&self, accuracy_threshold: f64) -> Verdict {
        Verdict::from_accuracy(self.metrics.accuracy, accuracy_threshold)
    }
}

/// Run the whole pipeline over ingested events
pub fn run_pipeline(events: &[RawEvent], config: &PipelineConfig) -> Result<TrainedPipeline> {
    let dataset = Dataset::from_events(events)?;
    run_on_dataset(&dataset, config)
}

/// Run the pipeline over an already-derived dataset
pub fn run_on_dataset(dataset: &Dataset, config: &PipelineConfig) -> Result<TrainedPipeline> {
    run_on_dataset_with_cancel(dataset, config, &AtomicBool::new(false))
}

/// As [`run_on_dataset`], checking `cancel` between boosting iterations
#[instrument(skip_all, fields(examples = dataset.len()))]
pub fn run_on_dataset_with_cancel(
    dataset: &Dataset,
    config: &PipelineConfig,
    cancel: &AtomicBool,
) -> Result<TrainedPipeline> {
    config.validate()?;
    info!(
        examples = dataset.len(),
        purchases = dataset.positive_count(),
        "Starting pipeline"
    );

    let (train_raw, test_raw) = split(dataset, config.split.test_fraction, config.split.seed)?;

    let params = Normalizer::fit(&train_raw)?;
    let train = params.transform_dataset(&train_raw);
    let test = params.transform_dataset(&test_raw);

    let ensemble = GbdtTrainer::new(config.boosting.clone()).train_with_cancel(&train, cancel)?;
    let metrics = evaluate(&ensemble, &test)?;

    info!(
        train = train.len(),
        test = test.len(),
        trees = ensemble.num_trees(),
        "Pipeline complete"
    );

    Ok(TrainedPipeline {
        params,
        ensemble,
        metrics,
        train_size: train.len(),
        test_size: test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;

    fn event(event_type: &str, product_id: u64, price: f64) -> RawEvent {
        RawEvent {
            event_time: "2019-10-01 00:00:00 UTC".into(),
            event_type: event_type.into(),
            product_id,
            category_id: 7,
            category_code: String::new(),
            brand: String::new(),
            price,
            user_id: product_id * 3,
            user_session: String::new(),
        }
    }

    #[test]
    fn test_malformed_event_aborts() {
        let events = vec![event("purchase", 1, 10.0), event("view", 2, f64::NAN)];
        let err = run_pipeline(&events, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_invalid_config_aborts() {
        let events = vec![event("purchase", 1, 10.0), event("view", 2, 20.0)];
        let mut config = PipelineConfig::default();
        config.split.test_fraction = 0.0;
        let err = run_pipeline(&events, &config).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFraction(_)));
    }

    #[test]
    fn test_single_class_training_aborts() {
        let events: Vec<RawEvent> = (0..10).map(|i| event("view", i, i as f64)).collect();
        let err = run_pipeline(&events, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn test_pipeline_separates_price_clusters() {
        let mut events = Vec::new();
        // Interleaved ids so only price separates the classes
        for i in 0..60u64 {
            events.push(event("purchase", 2 * i, 900.0 + i as f64));
            events.push(event("view", 2 * i + 1, 5.0 + i as f64));
        }

        let mut config = PipelineConfig::default();
        config.boosting.iterations = 20;
        let trained = run_pipeline(&events, &config).unwrap();

        assert_eq!(trained.train_size + trained.test_size, 120);
        assert_eq!(trained.test_size, 24);
        assert_eq!(trained.metrics.accuracy, 1.0);
        assert_eq!(trained.verdict(0.7), Verdict::Usable);
        assert!(trained.engine().predict(&event("view", 5, 950.0)).unwrap());
        assert!(!trained.engine().predict(&event("purchase", 5, 10.0)).unwrap());
    }
}
