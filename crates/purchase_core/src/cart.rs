//! CART (Classification and Regression Tree) builder
//!
//! Fits one regression tree to the pseudo-residuals of a boosting iteration
//! using exact-greedy splits over sorted feature values. Candidate
//! thresholds are the distinct observed values of a node, thinned to
//! count-quantile cut points when a feature has more than `max_bins` of them.
//!
//! Features are scanned in parallel; per-feature winners are then reduced
//! sequentially in feature order, so the selected split never depends on
//! thread scheduling.

use rayon::prelude::*;

use crate::config::BoostingConfig;
use crate::deterministic::SplitTieBreaker;
use crate::event::{FeatureVector, FEATURE_COUNT};
use crate::gbdt::{DecisionTree, Node};

/// Nodes smaller than this are scanned on the calling thread
const PARALLEL_MIN_SAMPLES: usize = 4096;

/// Reductions at or below this are treated as no improvement
const MIN_SPLIT_GAIN: f64 = 1e-12;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_leaf_size: usize,
    pub max_bins: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::from(&BoostingConfig::default())
    }
}

impl From<&BoostingConfig> for TreeConfig {
    fn from(config: &BoostingConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            min_leaf_size: config.min_leaf_size.max(1),
            max_bins: config.max_bins.max(2),
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    /// Larger reduction wins; exact ties go to the lower (feature, threshold)
    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

fn pick_best(best: Option<SplitCandidate>, candidate: SplitCandidate) -> Option<SplitCandidate> {
    match best {
        Some(current) if !candidate.beats(&current) => Some(current),
        _ => Some(candidate),
    }
}

/// Build a regression tree using exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [FeatureVector],
    residuals: &'a [f64],
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [FeatureVector], residuals: &'a [f64], config: TreeConfig) -> Self {
        assert_eq!(features.len(), residuals.len());
        Self {
            config,
            features,
            residuals,
        }
    }

    /// Build tree and return nodes
    pub fn build(&self) -> DecisionTree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.features.len()).collect();

        self.build_node(&indices, 0, &mut nodes);

        DecisionTree::new(nodes)
    }

    /// Recursively build tree nodes, returning the index of the new node
    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> usize {
        let current_idx = nodes.len();

        if depth >= self.config.max_depth || indices.len() < 2 * self.config.min_leaf_size {
            nodes.push(Node::leaf(self.leaf_value(indices)));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices, indices.len() >= PARALLEL_MIN_SAMPLES)
        else {
            nodes.push(Node::leaf(self.leaf_value(indices)));
            return current_idx;
        };

        let (left_indices, right_indices) =
            self.split_samples(indices, split.feature_idx, split.threshold);

        // Reserve the slot; children are patched in once built
        nodes.push(Node::internal(split.feature_idx, split.threshold, 0, 0));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes);

        nodes[current_idx] = Node::internal(split.feature_idx, split.threshold, left_idx, right_idx);

        current_idx
    }

    /// Best split over all features, or `None` when nothing improves the node
    fn find_best_split(&self, indices: &[usize], parallel: bool) -> Option<SplitCandidate> {
        let node_sum = self.sum_residuals(indices);

        let per_feature: Vec<Option<SplitCandidate>> = if parallel {
            (0..FEATURE_COUNT)
                .into_par_iter()
                .map(|f| self.best_split_for_feature(indices, f, node_sum))
                .collect()
        } else {
            (0..FEATURE_COUNT)
                .map(|f| self.best_split_for_feature(indices, f, node_sum))
                .collect()
        };

        per_feature
            .into_iter()
            .flatten()
            .fold(None, pick_best)
            .filter(|s| s.gain > MIN_SPLIT_GAIN)
    }

    /// Scan one feature's sorted values and keep the best admissible threshold
    fn best_split_for_feature(
        &self,
        indices: &[usize],
        feature_idx: usize,
        node_sum: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let value = |i: usize| self.features[i][feature_idx];

        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| value(a).total_cmp(&value(b)));

        // prefix[p] = sum of residuals of the first p sorted samples
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        let mut running = 0.0;
        for &i in &order {
            running += self.residuals[i];
            prefix.push(running);
        }

        // Boundary p splits order[..p] | order[p..] between two distinct values
        let boundaries: Vec<usize> = (1..n)
            .filter(|&p| value(order[p - 1]) < value(order[p]))
            .collect();
        let boundaries = self.thin_boundaries(boundaries, n);

        let parent_score = node_sum * node_sum / n as f64;
        let min_leaf = self.config.min_leaf_size;
        let mut best: Option<SplitCandidate> = None;

        for p in boundaries {
            let (n_left, n_right) = (p, n - p);
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let sum_left = prefix[p];
            let sum_right = node_sum - sum_left;
            let gain = sum_left * sum_left / n_left as f64 + sum_right * sum_right / n_right as f64
                - parent_score;

            let candidate = SplitCandidate::new(feature_idx, value(order[p - 1]), gain);
            best = pick_best(best, candidate);
        }

        best
    }

    /// Reduce boundaries to at most `max_bins - 1` count-quantile cut points
    fn thin_boundaries(&self, boundaries: Vec<usize>, n: usize) -> Vec<usize> {
        let max_cuts = self.config.max_bins - 1;
        if boundaries.len() <= max_cuts {
            return boundaries;
        }

        let mut thinned: Vec<usize> = Vec::with_capacity(max_cuts);
        for k in 1..self.config.max_bins {
            let target = k * n / self.config.max_bins;
            let pos = boundaries.partition_point(|&p| p < target);
            if let Some(&p) = boundaries.get(pos) {
                if thinned.last() != Some(&p) {
                    thinned.push(p);
                }
            }
        }
        thinned
    }

    /// Split samples based on threshold
    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .copied()
            .partition(|&idx| self.features[idx][feature_idx] <= threshold)
    }

    fn sum_residuals(&self, indices: &[usize]) -> f64 {
        indices.iter().map(|&i| self.residuals[i]).sum()
    }

    /// Leaf output: mean residual of the samples routed here
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        self.sum_residuals(indices) / indices.len() as f64
    }
}
