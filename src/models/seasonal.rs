//! Additive trend plus seasonality forecaster
//!
//! Stands in for a full decomposition library: a least-squares linear trend
//! over the training close series plus a seasonal offset averaged by
//! position within the cycle. Unlike the tabular adapters it never sees the
//! engineered features; it models the close series directly and
//! extrapolates past the end of the train window.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Seasonal cycle length for a bar interval: minute-level data repeats on
/// the hour, everything else weekly.
pub fn period_for_interval(interval: &str) -> usize {
    if interval.ends_with("minute") {
        60
    } else {
        7
    }
}

/// Fitted decomposition state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalModel {
    intercept: f64,
    slope: f64,
    seasonal: Vec<f64>,
    period: usize,
    train_len: usize,
}

impl SeasonalModel {
    /// Fit trend and seasonal components on a training close series.
    ///
    /// The seasonal component needs at least two full cycles of data;
    /// shorter series fall back to a pure linear trend.
    pub fn fit(close: ArrayView1<'_, f64>, period: usize) -> Self {
        let n = close.len();
        let period = period.max(1);

        let (intercept, slope) = if n >= 2 {
            let nf = n as f64;
            let t_mean = (nf - 1.0) / 2.0;
            let y_mean = close.sum() / nf;
            let mut num = 0.0;
            let mut den = 0.0;
            for (t, &y) in close.iter().enumerate() {
                let dt = t as f64 - t_mean;
                num += dt * (y - y_mean);
                den += dt * dt;
            }
            let slope = if den > 0.0 { num / den } else { 0.0 };
            (y_mean - slope * t_mean, slope)
        } else {
            let level = close.iter().next().copied().unwrap_or(0.0);
            (level, 0.0)
        };

        let mut seasonal = vec![0.0; period];
        if n >= 2 * period {
            let mut sums = vec![0.0; period];
            let mut counts = vec![0usize; period];
            for (t, &y) in close.iter().enumerate() {
                let detrended = y - (intercept + slope * t as f64);
                sums[t % period] += detrended;
                counts[t % period] += 1;
            }
            for p in 0..period {
                if counts[p] > 0 {
                    seasonal[p] = sums[p] / counts[p] as f64;
                }
            }
            // center so the seasonal component carries no level of its own
            let level: f64 = seasonal.iter().sum::<f64>() / period as f64;
            for s in seasonal.iter_mut() {
                *s -= level;
            }
        }

        Self {
            intercept,
            slope,
            seasonal,
            period,
            train_len: n,
        }
    }

    /// Forecast the `steps` positions immediately after the train window
    pub fn forecast(&self, steps: usize) -> Array1<f64> {
        Array1::from_iter((0..steps).map(|k| {
            let t = self.train_len + k;
            self.intercept + self.slope * t as f64 + self.seasonal[t % self.period]
        }))
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }
}
