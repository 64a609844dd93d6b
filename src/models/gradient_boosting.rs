//! Gradient-boosted regression trees
//!
//! Native residual-fitting implementation. Each round fits a shallow tree
//! to the current residuals over a row/column subsample, then folds the
//! damped tree output back into the running prediction for every row.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTree;
use crate::error::{EngineError, Result};

/// Boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn per round
    pub subsample: f64,
    /// Fraction of columns drawn per round
    pub colsample: f64,
    pub seed: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            learning_rate: 0.05,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 0.8,
            colsample: 0.8,
            seed: 42,
        }
    }
}

/// Gradient boosting regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    columns_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
}

impl GradientBoosting {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            columns_per_tree: Vec::new(),
            initial_prediction: 0.0,
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Fit boosting rounds sequentially
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(EngineError::ShapeMismatch {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(EngineError::ShapeMismatch {
                expected: "a non-empty training matrix".to_string(),
                actual: format!("{}x{}", n_samples, n_features),
            });
        }

        self.trees = Vec::with_capacity(self.config.n_estimators);
        self.columns_per_tree = Vec::with_capacity(self.config.n_estimators);
        self.initial_prediction = y.mean().unwrap_or(0.0);

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        for _ in 0..self.config.n_estimators {
            let residuals =
                Array1::from_iter(y.iter().zip(predictions.iter()).map(|(t, p)| t - p));

            let rows = sample_indices(n_samples, self.config.subsample, &mut rng);
            let cols = sample_indices(n_features, self.config.colsample, &mut rng);

            let x_sub = x.select(Axis(0), &rows).select(Axis(1), &cols);
            let y_sub = Array1::from_iter(rows.iter().map(|&i| residuals[i]));

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit(&x_sub, &y_sub)?;

            // advance residuals on every row, not just the sampled ones
            let round = tree.predict(&x.select(Axis(1), &cols))?;
            for i in 0..n_samples {
                predictions[i] += self.config.learning_rate * round[i];
            }

            self.trees.push(tree);
            self.columns_per_tree.push(cols);
        }

        Ok(())
    }

    /// Predict by summing damped round outputs over the base value
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(EngineError::AdapterFailure(
                "predict called before fit".to_string(),
            ));
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, cols) in self.trees.iter().zip(self.columns_per_tree.iter()) {
            let round = tree.predict(&x.select(Axis(1), cols))?;
            for i in 0..x.nrows() {
                predictions[i] += self.config.learning_rate * round[i];
            }
        }
        Ok(predictions)
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

/// Draw `ceil(n * fraction)` distinct indices, returned sorted so matrix
/// selection stays cache-friendly and reproducible.
fn sample_indices(n: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let size = ((n as f64) * fraction).ceil() as usize;
    let size = size.clamp(1, n);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(size);
    indices.sort_unstable();
    indices
}
