//! Seeded train/test partitioning

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::deterministic::LcgRng;
use crate::errors::{PipelineError, Result};

/// Number of test examples for a dataset of `n` examples.
///
/// Rounds `n * test_fraction` to the nearest integer, keeps at least one
/// test example and at least one training example whenever `n > 1`.
pub fn test_count(n: usize, test_fraction: f64) -> usize {
    let count = (n as f64 * test_fraction).round() as usize;
    if n > 1 {
        count.clamp(1, n - 1)
    } else {
        count.min(n)
    }
}

/// Partition `dataset` into disjoint (train, test) subsets.
///
/// A seeded permutation of indices decides membership: the first
/// `test_count` permuted indices form the test set, the rest the training set.
pub fn split(dataset: &Dataset, test_fraction: f64, seed: i64) -> Result<(Dataset, Dataset)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidFraction(test_fraction));
    }

    let n = dataset.len();
    let mut indices: Vec<usize> = (0..n).collect();
    LcgRng::new(seed).shuffle(&mut indices);

    let n_test = test_count(n, test_fraction);
    let (test_idx, train_idx) = indices.split_at(n_test);
    debug!(seed, n_test, "Permuted dataset indices");

    let test: Dataset = test_idx.iter().map(|&i| dataset.examples[i]).collect();
    let train: Dataset = train_idx.iter().map(|&i| dataset.examples[i]).collect();

    info!(
        train = train.len(),
        test = test.len(),
        "Split dataset with test fraction {}",
        test_fraction
    );

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LabeledExample;

    fn numbered(n: usize) -> Dataset {
        (0..n)
            .map(|i| LabeledExample::new(i % 3 == 0, [i as f64, 0.0, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = split(&numbered(100), 0.2, 42).unwrap();
        assert_eq!(test.len(), 20);
        assert_eq!(train.len(), 80);
    }

    #[test]
    fn test_split_disjoint_and_complete() {
        let dataset = numbered(37);
        let (train, test) = split(&dataset, 0.3, 9).unwrap();

        let mut ids: Vec<usize> = train
            .iter()
            .chain(test.iter())
            .map(|e| e.features[0] as usize)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_reproducible() {
        let dataset = numbered(50);
        let a = split(&dataset, 0.25, 1234).unwrap();
        let b = split(&dataset, 0.25, 1234).unwrap();
        assert_eq!(a, b);

        let c = split(&dataset, 0.25, 4321).unwrap();
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_minimum_one_test_example() {
        let (train, test) = split(&numbered(3), 0.01, 5).unwrap();
        assert_eq!(test.len(), 1);
        assert_eq!(train.len(), 2);

        // Rounding up to the full dataset still leaves one training example
        let (train, test) = split(&numbered(2), 0.9, 5).unwrap();
        assert_eq!(test.len(), 1);
        assert_eq!(train.len(), 1);
    }

    #[test]
    fn test_single_example_goes_to_train() {
        let (train, test) = split(&numbered(1), 0.2, 5).unwrap();
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn test_invalid_fraction() {
        for fraction in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let err = split(&numbered(10), fraction, 1).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidFraction(_)));
        }
    }
}
