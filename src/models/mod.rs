//! Model adapters
//!
//! A closed set of trainable units behind one seam. `ModelKind` resolves a
//! requested model name up front, `ModelKind::train` produces a fresh
//! fitted state for one fold, and `TrainedModel` is the serializable state
//! the artifact store persists.

pub mod decision_tree;
#[cfg(feature = "boosted")]
pub mod gradient_boosting;
pub mod random_forest;
pub mod scaler;
pub mod seasonal;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
#[cfg(feature = "boosted")]
use gradient_boosting::{GradientBoosting, GradientBoostingConfig};
use random_forest::RandomForest;
use scaler::StandardScaler;
use seasonal::{period_for_interval, SeasonalModel};

/// Trees in the forest adapter
const FOREST_TREES: usize = 200;

/// One fold's training and test slices, as cut by the orchestrator
pub struct FoldData<'a> {
    pub train_x: ArrayView2<'a, f64>,
    pub train_y: ArrayView1<'a, f64>,
    pub test_x: ArrayView2<'a, f64>,
    /// Close series of the train window, for the decomposition adapter
    pub train_close: Array1<f64>,
    /// Rows the adapter must predict
    pub test_len: usize,
}

/// Supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    #[cfg(feature = "boosted")]
    GradientBoosting,
    Seasonal,
}

impl ModelKind {
    /// Resolve a requested model name.
    ///
    /// Unrecognized names map to `UnknownModel`; names that are recognized
    /// but compiled out map to `ModelUnavailable`. The caller reports
    /// either one as a skipped model.
    pub fn resolve(name: &str) -> Result<Self> {
        match name {
            "random_forest" => Ok(ModelKind::RandomForest),
            "gradient_boosting" => {
                #[cfg(feature = "boosted")]
                return Ok(ModelKind::GradientBoosting);
                #[cfg(not(feature = "boosted"))]
                return Err(EngineError::ModelUnavailable(
                    "gradient boosting support not compiled in".to_string(),
                ));
            }
            "seasonal" => Ok(ModelKind::Seasonal),
            _ => Err(EngineError::UnknownModel),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            #[cfg(feature = "boosted")]
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::Seasonal => "seasonal",
        }
    }

    /// Train a fresh model on one fold's training window
    pub fn train(&self, data: &FoldData<'_>, seed: u64, interval: &str) -> Result<TrainedModel> {
        match self {
            ModelKind::RandomForest => {
                let scaler = StandardScaler::fit(data.train_x);
                let x_train = scaler.transform(data.train_x);
                let y_train = data.train_y.to_owned();
                let mut forest = RandomForest::new(FOREST_TREES, seed);
                forest.fit(&x_train, &y_train)?;
                Ok(TrainedModel::RandomForest { scaler, forest })
            }
            #[cfg(feature = "boosted")]
            ModelKind::GradientBoosting => {
                let config = GradientBoostingConfig {
                    seed,
                    ..GradientBoostingConfig::default()
                };
                let mut model = GradientBoosting::new(config);
                model.fit(&data.train_x.to_owned(), &data.train_y.to_owned())?;
                Ok(TrainedModel::GradientBoosting(model))
            }
            ModelKind::Seasonal => {
                let model =
                    SeasonalModel::fit(data.train_close.view(), period_for_interval(interval));
                Ok(TrainedModel::Seasonal(model))
            }
        }
    }
}

/// Serializable fitted state, persisted as the model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    RandomForest {
        scaler: StandardScaler,
        forest: RandomForest,
    },
    #[cfg(feature = "boosted")]
    GradientBoosting(GradientBoosting),
    Seasonal(SeasonalModel),
}

impl TrainedModel {
    /// Predict the fold's test window
    pub fn predict(&self, data: &FoldData<'_>) -> Result<Array1<f64>> {
        let predictions = match self {
            TrainedModel::RandomForest { scaler, forest } => {
                let x_test = scaler.transform(data.test_x);
                forest.predict(&x_test)?
            }
            #[cfg(feature = "boosted")]
            TrainedModel::GradientBoosting(model) => model.predict(&data.test_x.to_owned())?,
            TrainedModel::Seasonal(model) => model.forecast(data.test_len),
        };

        if predictions.len() != data.test_len {
            return Err(EngineError::ShapeMismatch {
                expected: format!("{} predictions", data.test_len),
                actual: format!("{} predictions", predictions.len()),
            });
        }
        Ok(predictions)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::RandomForest { .. } => ModelKind::RandomForest,
            #[cfg(feature = "boosted")]
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
            TrainedModel::Seasonal(_) => ModelKind::Seasonal,
        }
    }
}
