//! Point-forecast error metrics

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Error metrics for a single fold. `mape` is undefined (and serializes as
/// null) when no entry produced a finite percentage error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub mape: Option<f64>,
}

/// Compute rmse, mae and mape for one test window.
///
/// Percentage errors are averaged only over entries with a non-zero true
/// value and a finite ratio; a division by zero drops the entry rather than
/// reporting infinite error.
pub fn evaluate(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> FoldMetrics {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return FoldMetrics {
            rmse: 0.0,
            mae: 0.0,
            mape: None,
        };
    }

    let mut sq_sum = 0.0;
    let mut abs_sum = 0.0;
    let mut ape_sum = 0.0;
    let mut ape_count = 0usize;

    for i in 0..n {
        let err = y_true[i] - y_pred[i];
        sq_sum += err * err;
        abs_sum += err.abs();

        let ape = (err / y_true[i]).abs();
        if ape.is_finite() {
            ape_sum += ape;
            ape_count += 1;
        }
    }

    FoldMetrics {
        rmse: (sq_sum / n as f64).sqrt(),
        mae: abs_sum / n as f64,
        mape: if ape_count > 0 {
            Some(ape_sum / ape_count as f64 * 100.0)
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![100.0, 101.0, 102.0];
        let metrics = evaluate(y.view(), y.view());
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.mape, Some(0.0));
    }

    #[test]
    fn test_hand_computed_values() {
        let y_true = array![100.0, 200.0];
        let y_pred = array![110.0, 180.0];
        let metrics = evaluate(y_true.view(), y_pred.view());
        // errors -10 and 20
        assert!((metrics.rmse - (250.0f64).sqrt()).abs() < 1e-12);
        assert!((metrics.mae - 15.0).abs() < 1e-12);
        // 10% and 10%
        assert!((metrics.mape.unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_true_value_excluded_from_mape() {
        let y_true = array![0.0, 10.0];
        let y_pred = array![1.0, 12.0];
        let metrics = evaluate(y_true.view(), y_pred.view());
        assert!((metrics.mape.unwrap() - 20.0).abs() < 1e-12);
        // rmse and mae still cover both entries
        assert!((metrics.mae - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_true_values_leave_mape_undefined() {
        let y_true = array![0.0, 0.0];
        let y_pred = array![1.0, 2.0];
        let metrics = evaluate(y_true.view(), y_pred.view());
        assert_eq!(metrics.mape, None);
        assert!(metrics.rmse > 0.0);
    }

    #[test]
    fn test_empty_window() {
        let empty = array![];
        let metrics = evaluate(empty.view(), empty.view());
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, None);
    }

    #[test]
    fn test_mape_serializes_null_when_undefined() {
        let metrics = FoldMetrics {
            rmse: 1.0,
            mae: 1.0,
            mape: None,
        };
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"mape\":null"));
    }
}
