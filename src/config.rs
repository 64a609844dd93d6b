//! Training request configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Immutable description of one training job.
///
/// Field defaults match the upstream request schema, so this deserializes
/// directly from an API body with only the instrument identity filled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRequest {
    /// Instrument identity, used for artifact naming and the final report
    pub instrument_token: u64,
    /// Bar interval name, e.g. "day" or "5minute"
    pub interval: String,
    /// Model names to evaluate, in order
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// How many bars ahead the prediction target is shifted
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
    /// Informational lookback size carried alongside the request
    #[serde(default = "default_lookback_window")]
    pub lookback_window: usize,
    /// Training window width in feature rows
    #[serde(default = "default_train_bars")]
    pub train_bars: usize,
    /// Test window width in feature rows
    #[serde(default = "default_test_bars")]
    pub test_bars: usize,
    /// Fold advance; defaults to `test_bars` when absent
    #[serde(default)]
    pub step_size: Option<usize>,
    /// Base seed for every randomized adapter
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_models() -> Vec<String> {
    vec![
        "random_forest".to_string(),
        "gradient_boosting".to_string(),
    ]
}

fn default_forecast_horizon() -> usize {
    1
}

fn default_lookback_window() -> usize {
    20
}

fn default_train_bars() -> usize {
    300
}

fn default_test_bars() -> usize {
    60
}

fn default_seed() -> u64 {
    42
}

impl TrainingRequest {
    /// Request with default windows and models for one instrument/interval
    /// pair.
    pub fn new(instrument_token: u64, interval: impl Into<String>) -> Self {
        Self {
            instrument_token,
            interval: interval.into(),
            models: default_models(),
            forecast_horizon: default_forecast_horizon(),
            lookback_window: default_lookback_window(),
            train_bars: default_train_bars(),
            test_bars: default_test_bars(),
            step_size: None,
            seed: default_seed(),
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn with_forecast_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    pub fn with_lookback_window(mut self, window: usize) -> Self {
        self.lookback_window = window;
        self
    }

    pub fn with_windows(mut self, train_bars: usize, test_bars: usize) -> Self {
        self.train_bars = train_bars;
        self.test_bars = test_bars;
        self
    }

    pub fn with_step_size(mut self, step: usize) -> Self {
        self.step_size = Some(step);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Effective fold advance
    pub fn step(&self) -> usize {
        self.step_size.unwrap_or(self.test_bars)
    }

    /// Feature rows the job requires before any fold is scheduled. The
    /// margin over one full fold keeps degenerate single-fold plans out.
    pub fn min_feature_rows(&self) -> usize {
        self.train_bars + self.test_bars + 10
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_empty() {
            return Err(EngineError::InvalidRequest("interval is empty".to_string()));
        }
        if self.models.is_empty() {
            return Err(EngineError::InvalidRequest(
                "models list is empty".to_string(),
            ));
        }
        if self.forecast_horizon == 0 {
            return Err(EngineError::InvalidRequest(
                "forecast_horizon must be positive".to_string(),
            ));
        }
        if self.lookback_window == 0 {
            return Err(EngineError::InvalidRequest(
                "lookback_window must be positive".to_string(),
            ));
        }
        if self.train_bars == 0 || self.test_bars == 0 {
            return Err(EngineError::InvalidRequest(
                "train_bars and test_bars must be positive".to_string(),
            ));
        }
        if self.step_size == Some(0) {
            return Err(EngineError::InvalidRequest(
                "step_size must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let request: TrainingRequest =
            serde_json::from_str(r#"{"instrument_token":256265,"interval":"day"}"#).unwrap();
        assert_eq!(request.models, vec!["random_forest", "gradient_boosting"]);
        assert_eq!(request.forecast_horizon, 1);
        assert_eq!(request.train_bars, 300);
        assert_eq!(request.test_bars, 60);
        assert_eq!(request.step_size, None);
        assert_eq!(request.step(), 60);
        assert_eq!(request.seed, 42);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let request = TrainingRequest::new(1, "5minute")
            .with_models(vec!["seasonal".to_string()])
            .with_windows(200, 50)
            .with_step_size(25)
            .with_seed(7);
        assert_eq!(request.step(), 25);
        assert_eq!(request.min_feature_rows(), 260);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        let empty_models = TrainingRequest::new(1, "day").with_models(vec![]);
        assert!(matches!(
            empty_models.validate(),
            Err(EngineError::InvalidRequest(_))
        ));

        let zero_horizon = TrainingRequest::new(1, "day").with_forecast_horizon(0);
        assert!(zero_horizon.validate().is_err());

        let zero_window = TrainingRequest::new(1, "day").with_windows(0, 50);
        assert!(zero_window.validate().is_err());

        let zero_step = TrainingRequest::new(1, "day").with_step_size(0);
        assert!(zero_step.validate().is_err());
    }
}
