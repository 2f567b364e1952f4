//! Variance and rounding primitives shared by every aggregator.

use crate::types::{Amount, Pct};
use serde::{Deserialize, Serialize};

/// Percentage deviation of `actual` from `predicted`.
///
/// A zero prediction yields `0.0`, never infinity or NaN.
pub fn variance_pct(actual: Amount, predicted: Amount) -> Pct {
    if predicted == 0.0 {
        return 0.0;
    }
    ((actual - predicted) / predicted) * 100.0
}

/// Signed-variance buckets relative to a symmetric threshold.
///
/// The neutral band `[-threshold, threshold]` is in neither bucket.
pub fn is_overprediction(variance: Pct, threshold: Pct) -> bool {
    variance < -threshold
}

pub fn is_underprediction(variance: Pct, threshold: Pct) -> bool {
    variance > threshold
}

pub fn is_high_variance(variance: Pct, threshold: Pct) -> bool {
    variance.abs() > threshold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionDirection {
    Underpredicted,
    Overpredicted,
    Accurate,
}

/// Direction of a prediction miss, with a ±5% accuracy tolerance.
pub fn prediction_direction(variance: Pct) -> PredictionDirection {
    if variance > 5.0 {
        PredictionDirection::Underpredicted
    } else if variance < -5.0 {
        PredictionDirection::Overpredicted
    } else {
        PredictionDirection::Accurate
    }
}

/// Round half toward +infinity (2.5 -> 3, -2.5 -> -2).
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Round to a whole number for integer summary columns.
pub fn round_amount(x: f64) -> i64 {
    round_half_up(x) as i64
}

/// Round to two decimal places.
pub fn round2(x: f64) -> f64 {
    round_half_up(x * 100.0) / 100.0
}

/// `part / whole` as a percentage, 0 for an empty whole.
pub fn pct_of(part: u64, whole: u64) -> Pct {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}
