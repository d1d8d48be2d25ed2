//! Deterministic purchase prediction core
//!
//! Learns, from a log of e-commerce events, whether a single event is a
//! purchase, using gradient-boosted regression trees on the logit scale.
//!
//! Modules:
//! - `event`: Raw events, label derivation and feature extraction
//! - `dataset`: Labeled example collections
//! - `normalize`: Min-max normalization fitted on training data
//! - `split`: Seeded train/test partitioning
//! - `cart`: Exact-greedy regression tree builder
//! - `trainer`: Gradient boosting loop
//! - `gbdt`: Trees, ensembles and scoring
//! - `evaluate`: Accuracy, AUC, F1 and friends
//! - `inference`: Single-record prediction
//! - `pipeline`: End-to-end orchestration
//! - `config`: TOML-backed configuration

pub mod cart;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod evaluate;
pub mod event;
pub mod gbdt;
pub mod inference;
pub mod normalize;
pub mod pipeline;
pub mod serde_canon;
pub mod split;
pub mod trainer;

pub use config::{BoostingConfig, EvaluationConfig, PipelineConfig, SplitConfig};
pub use dataset::Dataset;
pub use errors::{PipelineError, Result};
pub use evaluate::{evaluate, ConfusionMatrix, EvaluationMetrics, Verdict};
pub use event::{derive, extract_features, FeatureVector, LabeledExample, RawEvent, FEATURE_COUNT, FEATURE_NAMES};
pub use gbdt::{BoostedEnsemble, DecisionTree, Node, WeightedTree};
pub use inference::{predict, InferenceEngine};
pub use normalize::{FeatureRange, NormalizationParams, Normalizer};
pub use pipeline::{run_on_dataset, run_pipeline, TrainedPipeline};
pub use split::split;
pub use trainer::{GbdtTrainer, TrainingRun, TrainingState};

/// Crate version string for model metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
