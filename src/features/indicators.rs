//! Rolling-window and lag primitives with NaN propagation
//!
//! Every function keeps dataframe-style semantics: a window that is not yet
//! full, or that contains a NaN, produces NaN. Rows carrying NaN are
//! filtered later, when the feature table is assembled, so partial history
//! degrades row count instead of corrupting values.

/// One-bar simple return: `v[i] / v[i-1] - 1`, NaN at index 0.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        out[i] = values[i] / values[i - 1] - 1.0;
    }
    out
}

/// Rolling mean over a fixed window. The first `window - 1` slots stay NaN,
/// and a NaN anywhere in the window poisons that slot.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || window > n {
        return out;
    }
    for i in (window - 1)..n {
        let sum: f64 = values[i + 1 - window..=i].iter().sum();
        out[i] = sum / window as f64;
    }
    out
}

/// Values shifted forward by `periods` (NaN prefix).
pub fn lag(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in periods..n {
        out[i] = values[i - periods];
    }
    out
}

/// Values shifted backward by `periods` (NaN suffix). Used to build the
/// forecast target.
pub fn lead(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in 0..n.saturating_sub(periods) {
        out[i] = values[i + periods];
    }
    out
}

/// Relative strength index over simple rolling means of gains and losses.
///
/// A perfectly flat window divides zero by zero and stays NaN; a loss-free
/// window saturates at 100.
pub fn rsi(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let delta = values[i] - values[i - 1];
        if delta.is_nan() {
            continue;
        }
        gains[i] = if delta > 0.0 { delta } else { 0.0 };
        losses[i] = if delta < 0.0 { -delta } else { 0.0 };
    }

    let avg_gain = rolling_mean(&gains, window);
    let avg_loss = rolling_mean(&losses, window);

    (0..n)
        .map(|i| {
            let rs = avg_gain[i] / avg_loss[i];
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

/// True range per bar: the largest of (high - low, |high - prev close|,
/// |low - prev close|) over the candidates that are defined. The first bar
/// has no previous close and falls back to high - low.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len();
    let mut out = vec![f64::NAN; n];
    for i in 0..n {
        let mut candidates = [high[i] - low[i], f64::NAN, f64::NAN];
        if i > 0 {
            candidates[1] = (high[i] - close[i - 1]).abs();
            candidates[2] = (low[i] - close[i - 1]).abs();
        }
        let mut best = f64::NAN;
        for c in candidates {
            if c.is_nan() {
                continue;
            }
            if best.is_nan() || c > best {
                best = c;
            }
        }
        out[i] = best;
    }
    out
}
