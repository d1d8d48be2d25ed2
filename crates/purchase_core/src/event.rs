//! Raw e-commerce events and label/feature derivation
//!
//! Every event is reduced to a purchase label and a fixed-order numeric
//! feature vector. The order is part of the model contract: trees store
//! feature indices, so it must never change between training and inference.

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};

/// Number of numeric features taken from each event
pub const FEATURE_COUNT: usize = 4;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["product_id", "category_id", "price", "user_id"];

/// Event type that marks a positive example
pub const PURCHASE_EVENT: &str = "purchase";

/// Fixed-order numeric feature vector
pub type FeatureVector = [f64; FEATURE_COUNT];

/// One row of the behaviour log, exactly as ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_time: String,
    pub event_type: String,
    pub product_id: u64,
    pub category_id: u64,
    #[serde(default)]
    pub category_code: String,
    #[serde(default)]
    pub brand: String,
    pub price: f64,
    pub user_id: u64,
    #[serde(default)]
    pub user_session: String,
}

impl RawEvent {
    /// Whether this event records a purchase
    pub fn is_purchase(&self) -> bool {
        self.event_type == PURCHASE_EVENT
    }
}

/// Label plus features derived from a single event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub label: bool,
    pub features: FeatureVector,
}

impl LabeledExample {
    pub fn new(label: bool, features: FeatureVector) -> Self {
        Self { label, features }
    }
}

/// Derive the purchase label and feature vector from a raw event
pub fn derive(event: &RawEvent) -> Result<LabeledExample> {
    let features = extract_features(event)?;
    Ok(LabeledExample {
        label: event.is_purchase(),
        features,
    })
}

/// Extract only the feature vector; the label is not consulted.
pub fn extract_features(event: &RawEvent) -> Result<FeatureVector> {
    if !event.price.is_finite() {
        return Err(PipelineError::MalformedInput {
            field: "price",
            reason: format!("is not a finite number ({})", event.price),
        });
    }

    Ok([
        event.product_id as f64,
        event.category_id as f64,
        event.price,
        event.user_id as f64,
    ])
}

/// Reject feature vectors that cannot be ordered or scaled.
pub(crate) fn check_features(features: &FeatureVector) -> Result<()> {
    for (name, value) in FEATURE_NAMES.iter().zip(features.iter()) {
        if !value.is_finite() {
            return Err(PipelineError::MalformedInput {
                field: *name,
                reason: format!("is not a finite number ({value})"),
            });
        }
    }
    Ok(())
}
