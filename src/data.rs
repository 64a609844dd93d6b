//! Price bar input records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV observation.
///
/// Every field except the timestamp is nullable: upstream feeds deliver
/// partial bars, and the feature engineer turns missing values into NaN so
/// the affected rows drop out of the feature table instead of aborting the
/// job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Bar {
    /// Bar with every price field present.
    pub fn filled(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }
}
