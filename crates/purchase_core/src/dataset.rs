//! Labeled datasets
//!
//! An ordered collection of [`LabeledExample`]s with the statistics the
//! pipeline stages need (class balance, per-feature ranges).

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::event::{derive, LabeledExample, RawEvent, FEATURE_COUNT};

/// Ordered sequence of labeled examples
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub examples: Vec<LabeledExample>,
}

impl Dataset {
    pub fn new(examples: Vec<LabeledExample>) -> Self {
        Self { examples }
    }

    /// Derive every event, failing on the first malformed one
    pub fn from_events(events: &[RawEvent]) -> Result<Self> {
        let examples = events.iter().map(derive).collect::<Result<Vec<_>>>()?;
        Ok(Self { examples })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledExample> {
        self.examples.iter()
    }

    /// Number of purchase examples
    pub fn positive_count(&self) -> usize {
        self.examples.iter().filter(|e| e.label).count()
    }

    /// Number of non-purchase examples
    pub fn negative_count(&self) -> usize {
        self.len() - self.positive_count()
    }

    /// Fraction of purchase examples (0 for an empty dataset)
    pub fn positive_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.positive_count() as f64 / self.len() as f64
    }

    /// Both classes are present
    pub fn has_both_classes(&self) -> bool {
        let positives = self.positive_count();
        positives > 0 && positives < self.len()
    }

    /// Per-feature (min, max); `None` when empty
    pub fn feature_stats(&self) -> Option<[(f64, f64); FEATURE_COUNT]> {
        if self.is_empty() {
            return None;
        }

        let mut stats = [(f64::INFINITY, f64::NEG_INFINITY); FEATURE_COUNT];
        for example in &self.examples {
            for (i, &val) in example.features.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        Some(stats)
    }
}

impl FromIterator<LabeledExample> for Dataset {
    fn from_iter<I: IntoIterator<Item = LabeledExample>>(iter: I) -> Self {
        Self {
            examples: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dataset() -> Dataset {
        Dataset::new(vec![
            LabeledExample::new(true, [100.0, 200.0, 300.0, 1.0]),
            LabeledExample::new(false, [150.0, 250.0, 350.0, 2.0]),
            LabeledExample::new(false, [200.0, 300.0, 400.0, 3.0]),
        ])
    }

    #[test]
    fn test_class_counts() {
        let dataset = create_test_dataset();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.positive_count(), 1);
        assert_eq!(dataset.negative_count(), 2);
        assert!((dataset.positive_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert!(dataset.has_both_classes());
    }

    #[test]
    fn test_feature_stats() {
        let dataset = create_test_dataset();
        let stats = dataset.feature_stats().unwrap();
        assert_eq!(stats[0], (100.0, 200.0));
        assert_eq!(stats[1], (200.0, 300.0));
        assert_eq!(stats[2], (300.0, 400.0));
        assert_eq!(stats[3], (1.0, 3.0));
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        assert!(dataset.is_empty());
        assert!(dataset.feature_stats().is_none());
        assert_eq!(dataset.positive_rate(), 0.0);
        assert!(!dataset.has_both_classes());
    }
}
