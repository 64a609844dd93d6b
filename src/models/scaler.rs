//! Feature standardization

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardization fitted on the training window.
///
/// Columns with zero or undefined spread keep a scale of 1.0 so constant
/// features pass through centered instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations on a training matrix.
    pub fn fit(x: ArrayView2<'_, f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let mut scale = Array1::ones(x.ncols());
        for (j, col) in x.axis_iter(Axis(1)).enumerate() {
            let var = col.iter().map(|v| (v - mean[j]).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if std > 0.0 && std.is_finite() {
                scale[j] = std;
            }
        }
        Self { mean, scale }
    }

    /// Standardize a matrix with the fitted parameters.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let m = self.mean[j];
            let s = self.scale[j];
            col.mapv_inplace(|v| (v - m) / s);
        }
        out
    }
}
