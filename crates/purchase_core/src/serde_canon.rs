//! Canonical JSON serialization for deterministic hashing
//!
//! Object keys are sorted recursively and no whitespace is emitted, so two
//! equal values always produce the same bytes and the same blake3 digest.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::{PipelineError, Result};

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).map_err(|e| PipelineError::Serialization(e.to_string()))?;

    let canonical = canonicalize_value(&json_value);
    serde_json::to_string(&canonical).map_err(|e| PipelineError::Serialization(e.to_string()))
}

/// Canonicalize a JSON value by sorting all object keys recursively
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<_, _> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize_value(v)))
                .collect();
            serde_json::Value::Object(sorted.into_iter().collect())
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

/// Blake3 digest of a canonical JSON string, hex encoded
pub fn digest_hex(canonical_json: &str) -> String {
    hex::encode(blake3::hash(canonical_json.as_bytes()).as_bytes())
}

/// Compute Blake3 hash of the canonical JSON representation as hex
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String> {
    Ok(digest_hex(&to_canonical_json(value)?))
}
