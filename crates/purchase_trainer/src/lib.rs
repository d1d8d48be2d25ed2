//! Purchase trainer - CSV ingestion, reporting and model persistence
//!
//! Wraps the `purchase-core` pipeline with the outer surfaces needed to run
//! it end to end: loading an event log, printing evaluation results and
//! storing trained models as hashed canonical JSON bundles.

pub mod errors;
pub mod ingest;
pub mod persist;
pub mod report;

use purchase_core::{PipelineConfig, RawEvent, TrainedPipeline};
use std::path::Path;

pub use errors::TrainerError;
pub use ingest::{load_events, read_events};
pub use persist::{load_bundle, save_bundle, BundleMetadata, ModelBundle, SavedBundle};

/// Demonstration record scored after training when no sample is given
pub const DEFAULT_SAMPLE_PRODUCT_ID: u64 = 44_600_062;
pub const DEFAULT_SAMPLE_CATEGORY_ID: u64 = 2_103_807_459_595_387_724;
pub const DEFAULT_SAMPLE_PRICE: f64 = 35.79;
pub const DEFAULT_SAMPLE_USER_ID: u64 = 541_312_140;

/// Build an unlabeled event for prediction; only the feature fields are set
pub fn sample_event(product_id: u64, category_id: u64, price: f64, user_id: u64) -> RawEvent {
    RawEvent {
        event_time: String::new(),
        event_type: String::new(),
        product_id,
        category_id,
        category_code: String::new(),
        brand: String::new(),
        price,
        user_id,
        user_session: String::new(),
    }
}

/// Run the whole pipeline directly from a CSV file
pub fn train_from_csv(
    path: &Path,
    limit: Option<usize>,
    config: &PipelineConfig,
) -> Result<TrainedPipeline, TrainerError> {
    let events = load_events(path, limit)?;
    Ok(purchase_core::run_pipeline(&events, config)?)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
