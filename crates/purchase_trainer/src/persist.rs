//! Model bundle storage
//!
//! A bundle directory holds `model.json` (canonical JSON of the
//! [`ModelBundle`]) and `model.hash` (blake3 hex digest of those exact
//! bytes). Loading recomputes the digest and refuses a mismatch.

use chrono::{DateTime, Utc};
use purchase_core::serde_canon::{digest_hex, to_canonical_json};
use purchase_core::{
    BoostedEnsemble, EvaluationMetrics, InferenceEngine, NormalizationParams, PipelineConfig,
    TrainedPipeline,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::TrainerError;

pub const MODEL_FILE: &str = "model.json";
pub const HASH_FILE: &str = "model.hash";

/// Training provenance stored alongside the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub created_at: DateTime<Utc>,
    pub version: String,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: EvaluationMetrics,
    pub config: PipelineConfig,
}

/// Everything needed to serve predictions for a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub params: NormalizationParams,
    pub ensemble: BoostedEnsemble,
    pub metadata: BundleMetadata,
}

impl ModelBundle {
    pub fn from_pipeline(trained: &TrainedPipeline, config: &PipelineConfig) -> Self {
        Self {
            params: trained.params,
            ensemble: trained.ensemble.clone(),
            metadata: BundleMetadata {
                created_at: Utc::now(),
                version: crate::VERSION.to_string(),
                train_size: trained.train_size,
                test_size: trained.test_size,
                metrics: trained.metrics,
                config: config.clone(),
            },
        }
    }

    pub fn engine(&self) -> InferenceEngine<'_> {
        InferenceEngine::new(&self.params, &self.ensemble)
    }
}

/// Paths of a saved bundle plus its digest
#[derive(Debug, Clone)]
pub struct SavedBundle {
    pub model_path: PathBuf,
    pub hash_path: PathBuf,
    pub hash: String,
}

/// Write `model.json` and `model.hash` into `dir`, creating it if needed
pub fn save_bundle<P: AsRef<Path>>(dir: P, bundle: &ModelBundle) -> Result<SavedBundle, TrainerError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let canonical_json = to_canonical_json(bundle)?;
    let hash = digest_hex(&canonical_json);

    let model_path = dir.join(MODEL_FILE);
    info!("Saving model to: {}", model_path.display());
    fs::write(&model_path, &canonical_json)?;

    let hash_path = dir.join(HASH_FILE);
    info!("Saving hash to: {}", hash_path.display());
    fs::write(&hash_path, &hash)?;

    Ok(SavedBundle {
        model_path,
        hash_path,
        hash,
    })
}

/// Read a bundle back from `dir`, verifying its digest and tree structure
pub fn load_bundle<P: AsRef<Path>>(dir: P) -> Result<ModelBundle, TrainerError> {
    let dir = dir.as_ref();
    let canonical_json = fs::read_to_string(dir.join(MODEL_FILE))?;
    let expected = fs::read_to_string(dir.join(HASH_FILE))?.trim().to_string();

    let actual = digest_hex(&canonical_json);
    if actual != expected {
        warn!(%expected, %actual, "Model digest mismatch");
        return Err(TrainerError::HashMismatch { expected, actual });
    }

    let bundle: ModelBundle = serde_json::from_str(&canonical_json)?;
    bundle.ensemble.validate()?;

    info!(
        trees = bundle.ensemble.num_trees(),
        hash = %actual,
        "Loaded model bundle from {}",
        dir.display()
    );
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use purchase_core::{run_on_dataset, BoostingConfig, Dataset, LabeledExample};
    use tempfile::TempDir;

    fn trained() -> (TrainedPipeline, PipelineConfig) {
        let dataset: Dataset = (0..40)
            .map(|i| {
                let purchase = i % 2 == 0;
                let price = if purchase { 100.0 + i as f64 } else { 1.0 + i as f64 };
                LabeledExample::new(purchase, [i as f64, 3.0, price, (i * 13 % 7) as f64])
            })
            .collect();
        let config = PipelineConfig {
            boosting: BoostingConfig {
                iterations: 5,
                min_leaf_size: 2,
                ..BoostingConfig::default()
            },
            ..PipelineConfig::default()
        };
        (run_on_dataset(&dataset, &config).unwrap(), config)
    }

    #[test]
    fn test_save_and_load() {
        let (trained, config) = trained();
        let bundle = ModelBundle::from_pipeline(&trained, &config);
        let dir = TempDir::new().unwrap();

        let saved = save_bundle(dir.path(), &bundle).unwrap();
        assert_eq!(saved.hash.len(), 64);
        assert_eq!(fs::read_to_string(&saved.hash_path).unwrap(), saved.hash);

        let loaded = load_bundle(dir.path()).unwrap();
        assert_eq!(loaded, bundle);
        assert_eq!(
            loaded.ensemble.hash_hex().unwrap(),
            trained.ensemble.hash_hex().unwrap()
        );
    }

    #[test]
    fn test_tampered_model_rejected() {
        let (trained, config) = trained();
        let dir = TempDir::new().unwrap();
        let saved = save_bundle(dir.path(), &ModelBundle::from_pipeline(&trained, &config)).unwrap();

        let json = fs::read_to_string(&saved.model_path).unwrap();
        fs::write(&saved.model_path, json.replacen("\"train_size\":", "\"train_size\":1", 1)).unwrap();

        assert!(matches!(
            load_bundle(dir.path()),
            Err(TrainerError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_bundle() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(load_bundle(dir.path()), Err(TrainerError::Io(_))));
    }
}
