//! Bootstrap-aggregated regression forest

use ndarray::{Array1, Array2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTree;
use crate::error::{EngineError, Result};

/// Random forest regressor.
///
/// Trees train on bootstrap resamples in parallel. Each tree derives its
/// rng from the base seed plus its index, so results are reproducible
/// regardless of how rayon schedules the work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl RandomForest {
    /// Forest with `n_estimators` trees and the given base seed
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min: usize) -> Self {
        self.min_samples_split = min;
        self
    }

    pub fn with_min_samples_leaf(mut self, min: usize) -> Self {
        self.min_samples_leaf = min;
        self
    }

    /// Fit all trees on bootstrap resamples of the training data
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

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = Array1::from_iter(sample_indices.iter().map(|&i| y[i]));

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf);
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(self)
    }

    /// Predict by averaging tree outputs in tree order
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(EngineError::AdapterFailure(
                "predict called before fit".to_string(),
            ));
        }

        let per_tree: Result<Vec<Array1<f64>>> =
            self.trees.par_iter().map(|tree| tree.predict(x)).collect();
        let per_tree = per_tree?;

        let n_trees = per_tree.len() as f64;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / n_trees)
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((120, 4), |(i, j)| ((i * 5 + j * 3) % 31) as f64);
        let y = Array1::from_shape_fn(120, |i| x[[i, 0]] * 2.0 + x[[i, 2]] * 0.5);
        (x, y)
    }

    #[test]
    fn test_fit_trains_all_trees() {
        let (x, y) = training_data();
        let mut forest = RandomForest::new(25, 42).with_max_depth(8);
        let result = forest.fit(&x, &y);
        assert!(result.is_ok(), "fit failed: {:?}", result.err());
        assert_eq!(forest.n_trees(), 25);
    }

    #[test]
    fn test_predictions_track_target() {
        let (x, y) = training_data();
        let mut forest = RandomForest::new(30, 42);
        forest.fit(&x, &y).unwrap();
        let preds = forest.predict(&x).unwrap();

        let mean_abs_err: f64 = preds
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / y.len() as f64;
        let target_spread = y.iter().cloned().fold(f64::MIN, f64::max)
            - y.iter().cloned().fold(f64::MAX, f64::min);
        assert!(mean_abs_err < target_spread * 0.2);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = training_data();
        let mut a = RandomForest::new(15, 7);
        let mut b = RandomForest::new(15, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_different_seeds_differ() {
        let (x, y) = training_data();
        let mut a = RandomForest::new(15, 1);
        let mut b = RandomForest::new(15, 2);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_ne!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForest::new(10, 42);
        assert!(forest.predict(&Array2::zeros((2, 4))).is_err());
    }
}
