//! Regression tree used by the ensemble adapters
//!
//! CART-style binary tree minimizing weighted child variance. Split search
//! runs per feature in parallel and sweeps samples in sorted order with
//! running sums, so each node costs one sort plus one pass per feature.

use std::cmp::Ordering;

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tree node: either a mean-value leaf or a binary split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Regression tree with variance-reduction splits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min: usize) -> Self {
        self.min_samples_split = min.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min: usize) -> Self {
        self.min_samples_leaf = min.max(1);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(EngineError::ShapeMismatch {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(EngineError::ShapeMismatch {
                expected: "at least one sample".to_string(),
                actual: "0 rows".to_string(),
            });
        }

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0));
        Ok(self)
    }

    fn build_node(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let stats = NodeStats::over(y, indices);

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || stats.variance() <= f64::EPSILON;
        if should_stop {
            return TreeNode::Leaf {
                value: stats.mean(),
                n_samples,
            };
        }

        match self.find_best_split(x, y, indices, &stats) {
            Some((feature_idx, threshold)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_indices.len() < self.min_samples_leaf
                    || right_indices.len() < self.min_samples_leaf
                {
                    return TreeNode::Leaf {
                        value: stats.mean(),
                        n_samples,
                    };
                }

                let left = Box::new(self.build_node(x, y, &left_indices, depth + 1));
                let right = Box::new(self.build_node(x, y, &right_indices, depth + 1));
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                }
            }
            None => TreeNode::Leaf {
                value: stats.mean(),
                n_samples,
            },
        }
    }

    /// Best (feature, threshold) by variance reduction, or None when no
    /// split improves on the parent. Ties resolve to the highest feature
    /// index, which keeps the result independent of thread scheduling.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent: &NodeStats,
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let parent_impurity = parent.variance();

        let per_feature: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_by(|&a, &b| {
                    x[[a, feature_idx]]
                        .partial_cmp(&x[[b, feature_idx]])
                        .unwrap_or(Ordering::Equal)
                });

                let mut left = NodeStats::default();
                let mut best: Option<(usize, f64, f64)> = None;
                for pos in 0..order.len() - 1 {
                    left.add(y[order[pos]]);
                    let value = x[[order[pos], feature_idx]];
                    let next = x[[order[pos + 1], feature_idx]];
                    if value == next {
                        continue;
                    }
                    let right = parent.minus(&left);
                    if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                        continue;
                    }
                    let weighted = (left.count as f64 * left.variance()
                        + right.count as f64 * right.variance())
                        / n;
                    let gain = parent_impurity - weighted;
                    if gain > best.map_or(0.0, |(_, _, g)| g) {
                        best = Some((feature_idx, (value + next) / 2.0, gain));
                    }
                }
                best
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
            .map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    /// Predict target values for each row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| EngineError::AdapterFailure("predict called before fit".to_string()))?;

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let row: Vec<f64> = x.row(i).to_vec();
                predict_row(root, &row)
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Depth of the fitted tree (0 for a bare leaf)
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn predict_row(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_row(left, sample)
            } else {
                predict_row(right, sample)
            }
        }
    }
}

/// Running count/sum/sum-of-squares over a sample subset
#[derive(Debug, Clone, Copy, Default)]
struct NodeStats {
    count: usize,
    sum: f64,
    sq_sum: f64,
}

impl NodeStats {
    fn over(y: &Array1<f64>, indices: &[usize]) -> Self {
        let mut stats = Self::default();
        for &i in indices {
            stats.add(y[i]);
        }
        stats
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sq_sum += value * value;
    }

    fn minus(&self, other: &Self) -> Self {
        Self {
            count: self.count - other.count,
            sum: self.sum - other.sum,
            sq_sum: self.sq_sum - other.sq_sum,
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        // clamp tiny negative values from cancellation
        (self.sq_sum / self.count as f64 - mean * mean).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_and_predict_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 5.0, 5.0, 5.0];

        let mut tree = DecisionTree::new();
        let result = tree.fit(&x, &y);
        assert!(result.is_ok(), "fit failed: {:?}", result.err());

        let preds = tree.predict(&array![[2.0], [11.0]]).unwrap();
        assert!((preds[0] - 0.0).abs() < 1e-9);
        assert!((preds[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_target_yields_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![7.0, 7.0, 7.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 0);
        let preds = tree.predict(&x).unwrap();
        assert!(preds.iter().all(|p| (*p - 7.0).abs() < 1e-12));
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let x = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(64, |i| (i as f64).sin() * 10.0);

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 3.0, 100.0];
        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();

        fn check(node: &TreeNode, min: usize) {
            match node {
                TreeNode::Leaf { n_samples, .. } => assert!(*n_samples >= min),
                TreeNode::Split { left, right, .. } => {
                    check(left, min);
                    check(right, min);
                }
            }
        }
        if let Some(root) = &tree.root {
            check(root, 2);
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut tree = DecisionTree::new();
        assert!(matches!(
            tree.fit(&x, &y),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let tree = DecisionTree::new();
        assert!(tree.predict(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_deterministic_across_fits() {
        let x = Array2::from_shape_fn((80, 5), |(i, j)| ((i * 7 + j * 13) % 23) as f64);
        let y = Array1::from_shape_fn(80, |i| ((i * 11) % 17) as f64);

        let mut a = DecisionTree::new().with_max_depth(6);
        let mut b = DecisionTree::new().with_max_depth(6);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let probe = Array2::from_shape_fn((30, 5), |(i, j)| ((i * 3 + j) % 19) as f64);
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }
}
