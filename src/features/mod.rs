//! Feature engineering over price bars
//!
//! Turns a raw OHLCV series into a dense supervised table: indicator and
//! lag columns plus a close price shifted `forecast_horizon` bars into the
//! future as the target. Rows that fall inside the indicator warmup span or
//! carry any undefined value are dropped, so every surviving row is fully
//! populated.

pub mod indicators;

use std::ops::Range;

use chrono::{DateTime, Utc};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

use crate::data::Bar;
use crate::error::{EngineError, Result};
use indicators::{lag, lead, rolling_mean, rsi, simple_returns, true_range};

/// Moving-average windows applied to close
const SMA_WINDOWS: [usize; 3] = [20, 50, 200];
/// Lag offsets applied to close and volume
const LAG_PERIODS: [usize; 6] = [1, 2, 3, 5, 10, 20];
const RSI_WINDOW: usize = 14;
const ATR_WINDOW: usize = 14;

/// Rows become eligible only once the longest lookback window has a full
/// history behind it.
const WARMUP_ROWS: usize = 200;

/// Engineered features plus the supervised target, one row per eligible
/// bar. Rows stay in strict timestamp order.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    timestamps: Vec<DateTime<Utc>>,
    names: Vec<String>,
    values: Array2<f64>,
    target: Array1<f64>,
    close_idx: usize,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Feature column names, in storage order
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn timestamp_at(&self, row: usize) -> DateTime<Utc> {
        self.timestamps[row]
    }

    /// Full feature matrix, rows x columns
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn target(&self) -> ArrayView1<'_, f64> {
        self.target.view()
    }

    /// Feature rows for one window
    pub fn feature_rows(&self, rows: Range<usize>) -> ArrayView2<'_, f64> {
        self.values.slice(s![rows, ..])
    }

    /// Target values for one window
    pub fn target_rows(&self, rows: Range<usize>) -> ArrayView1<'_, f64> {
        self.target.slice(s![rows])
    }

    /// Owned copy of the close column for one window. The decomposition
    /// adapter models this series directly instead of the feature matrix.
    pub fn close_rows(&self, rows: Range<usize>) -> Array1<f64> {
        self.values.slice(s![rows, self.close_idx]).to_owned()
    }
}

/// Build the feature table from raw bars.
///
/// Bars are defensively re-sorted by timestamp before anything else.
/// Missing OHLCV values become NaN and poison every window they touch; a
/// row is kept only when every feature column and the target are defined
/// and the row sits past the warmup span. `min_rows` is the caller's
/// history floor: fewer surviving rows is `InsufficientHistory`.
pub fn engineer(bars: &[Bar], forecast_horizon: usize, min_rows: usize) -> Result<FeatureTable> {
    let mut ordered: Vec<&Bar> = bars.iter().collect();
    ordered.sort_by_key(|b| b.timestamp);
    let n = ordered.len();

    let missing = |v: Option<f64>| v.unwrap_or(f64::NAN);
    let open: Vec<f64> = ordered.iter().map(|b| missing(b.open)).collect();
    let high: Vec<f64> = ordered.iter().map(|b| missing(b.high)).collect();
    let low: Vec<f64> = ordered.iter().map(|b| missing(b.low)).collect();
    let close: Vec<f64> = ordered.iter().map(|b| missing(b.close)).collect();
    let volume: Vec<f64> = ordered.iter().map(|b| missing(b.volume)).collect();

    let returns = simple_returns(&close);
    let smas: Vec<Vec<f64>> = SMA_WINDOWS.iter().map(|&w| rolling_mean(&close, w)).collect();
    let rsi_col = rsi(&close, RSI_WINDOW);
    let atr_col = rolling_mean(&true_range(&high, &low, &close), ATR_WINDOW);
    let close_lags: Vec<Vec<f64>> = LAG_PERIODS.iter().map(|&p| lag(&close, p)).collect();
    let volume_lags: Vec<Vec<f64>> = LAG_PERIODS.iter().map(|&p| lag(&volume, p)).collect();
    let target_col = lead(&close, forecast_horizon);

    let mut names: Vec<String> = ["open", "high", "low", "close", "volume", "return"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut columns: Vec<Vec<f64>> = vec![open, high, low, close, volume, returns];

    for (w, col) in SMA_WINDOWS.iter().zip(smas) {
        names.push(format!("sma_{}", w));
        columns.push(col);
    }
    names.push("rsi".to_string());
    columns.push(rsi_col);
    names.push("atr".to_string());
    columns.push(atr_col);
    for ((p, close_col), volume_col) in LAG_PERIODS.iter().zip(close_lags).zip(volume_lags) {
        names.push(format!("close_lag_{}", p));
        columns.push(close_col);
        names.push(format!("volume_lag_{}", p));
        columns.push(volume_col);
    }

    let keep: Vec<usize> = (WARMUP_ROWS.min(n)..n)
        .filter(|&i| columns.iter().all(|c| !c[i].is_nan()) && !target_col[i].is_nan())
        .collect();

    if keep.len() < min_rows {
        return Err(EngineError::InsufficientHistory {
            required: min_rows,
            available: keep.len(),
        });
    }

    let values = Array2::from_shape_fn((keep.len(), columns.len()), |(r, c)| columns[c][keep[r]]);
    let target = Array1::from_iter(keep.iter().map(|&i| target_col[i]));
    let timestamps: Vec<DateTime<Utc>> = keep.iter().map(|&i| ordered[i].timestamp).collect();
    let close_idx = names.iter().position(|name| name == "close").unwrap_or(3);

    debug!(
        input_bars = n,
        feature_rows = keep.len(),
        columns = names.len(),
        "engineered feature table"
    );

    Ok(FeatureTable {
        timestamps,
        names,
        values,
        target,
        close_idx,
    })
}
