//! Arena-indexed regression trees
//!
//! Nodes live in a flat vector and reference their children by index.
//! Node 0 is the root. Trees are immutable once built, so an ensemble can
//! be cloned or shared across threads without synchronization.

use serde::{Deserialize, Serialize};

use crate::event::FEATURE_COUNT;

/// A decision tree node (internal split or leaf)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Route left when `features[feature_idx] <= threshold`
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node holding the tree's contribution
    Leaf { value: f64 },
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(feature_idx: usize, threshold: f64, left: usize, right: usize) -> Self {
        Node::Split {
            feature_idx,
            threshold,
            left,
            right,
        }
    }

    /// Create a new leaf node
    pub fn leaf(value: f64) -> Self {
        Node::Leaf { value }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Get the leaf value if this is a leaf node
    pub fn leaf_value(&self) -> Option<f64> {
        match self {
            Node::Leaf { value } => Some(*value),
            Node::Split { .. } => None,
        }
    }
}

/// A single regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature vector.
    ///
    /// A malformed tree (dangling child or feature index) contributes 0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        // A well-formed tree reaches a leaf in at most `nodes.len()` steps
        for _ in 0..=self.nodes.len() {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            match *node {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    let Some(&value) = features.get(feature_idx) else {
                        return 0.0;
                    };
                    idx = if value <= threshold { left } else { right };
                }
            }
        }

        0.0
    }

    /// Get the root node
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Depth of the deepest leaf (a single-leaf tree has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) if *left > idx && *right > idx => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        if self.nodes.is_empty() {
            return 0;
        }
        walk(&self.nodes, 0)
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    // Children are always appended after their parent
                    if left <= i || left >= self.nodes.len() {
                        return Err(format!("Node {} has invalid left child: {}", i, left));
                    }
                    if right <= i || right >= self.nodes.len() {
                        return Err(format!("Node {} has invalid right child: {}", i, right));
                    }
                    if feature_idx >= FEATURE_COUNT {
                        return Err(format!(
                            "Internal node {} has invalid feature index: {}",
                            i, feature_idx
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("Internal node {i} has non-finite threshold"));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("Leaf node {i} has non-finite value"));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> DecisionTree {
        // if feature[0] <= 0.5 return -1.0, else return 2.0
        DecisionTree::new(vec![
            Node::internal(0, 0.5, 1, 2),
            Node::leaf(-1.0),
            Node::leaf(2.0),
        ])
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(3, 0.25, 1, 2);
        assert!(!internal.is_leaf());
        assert_eq!(internal.leaf_value(), None);

        let leaf = Node::leaf(-0.234);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf_value(), Some(-0.234));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0.3, 0.0, 0.0, 0.0]), -1.0);
        assert_eq!(tree.evaluate(&[0.5, 0.0, 0.0, 0.0]), -1.0); // Equal goes left
        assert_eq!(tree.evaluate(&[0.6, 0.0, 0.0, 0.0]), 2.0);
    }

    #[test]
    fn test_malformed_tree_contributes_zero() {
        let dangling = DecisionTree::new(vec![Node::internal(0, 0.5, 7, 8)]);
        assert_eq!(dangling.evaluate(&[0.1]), 0.0);

        let cyclic = DecisionTree::new(vec![Node::internal(0, 0.5, 0, 0)]);
        assert_eq!(cyclic.evaluate(&[0.1]), 0.0);

        assert_eq!(DecisionTree::new(vec![]).evaluate(&[0.1]), 0.0);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate().is_ok());

        let invalid = DecisionTree::new(vec![
            Node::internal(0, 0.5, 5, 2), // left=5 is invalid
            Node::leaf(1.0),
            Node::leaf(2.0),
        ]);
        assert!(invalid.validate().is_err());

        let bad_feature = DecisionTree::new(vec![
            Node::internal(FEATURE_COUNT, 0.5, 1, 2),
            Node::leaf(1.0),
            Node::leaf(2.0),
        ]);
        assert!(bad_feature.validate().is_err());

        assert!(DecisionTree::new(vec![]).validate().is_err());
    }

    #[test]
    fn test_shape() {
        let tree = stump();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(DecisionTree::new(vec![Node::leaf(0.0)]).depth(), 0);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Node::leaf(1.5)).unwrap();
        assert_eq!(json, r#"{"kind":"leaf","value":1.5}"#);
    }
}
