//! Overall model performance: one row describing how well predictions
//! track actual settlements across the whole input.

use crate::{
    aggregator::ClaimAggregator,
    config::EngineConfig,
    error::AggResult,
    output::SummaryWriter,
    record::Claim,
    types::Pct,
    variance::{
        is_high_variance, is_overprediction, is_underprediction, pct_of, prediction_direction,
        round2, round_amount, PredictionDirection,
    },
};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const MODEL_PERFORMANCE_FILE: &str = "model_performance_summary.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AccuracyTally {
    accurate: u64,
    total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPerformanceRow {
    pub total_claims: u64,
    pub avg_actual_settlement: i64,
    pub avg_predicted_settlement: i64,
    pub overall_variance_pct: f64,
    pub mape: f64,
    pub rmse: i64,
    pub overprediction_rate: f64,
    pub underprediction_rate: f64,
    pub high_variance_rate: f64,
    pub accurate_direction_rate: f64,
    /// Percent of claims within the accuracy band, per severity category.
    #[serde(serialize_with = "as_json")]
    pub accuracy_by_severity: BTreeMap<String, f64>,
    /// Same, per `ACTUAL_SETTLEMENT_CATEGORY`.
    #[serde(serialize_with = "as_json")]
    pub accuracy_by_amount: BTreeMap<String, f64>,
}

/// Nested maps go into a single CSV cell as compact JSON.
fn as_json<S: Serializer>(map: &BTreeMap<String, f64>, s: S) -> Result<S::Ok, S::Error> {
    let json = serde_json::to_string(map).map_err(serde::ser::Error::custom)?;
    s.serialize_str(&json)
}

pub struct ModelPerformanceAggregator {
    threshold: Pct,
    accuracy_band: Pct,
    count: u64,
    total_actual: f64,
    total_predicted: f64,
    total_variance: f64,
    abs_pct_error_sum: f64,
    squared_error_sum: f64,
    overpredicted: u64,
    underpredicted: u64,
    high_variance: u64,
    accurate_direction: u64,
    by_severity: BTreeMap<String, AccuracyTally>,
    by_amount: BTreeMap<String, AccuracyTally>,
}

impl ModelPerformanceAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.high_variance_threshold_pct,
            accuracy_band: config.accuracy_band_pct,
            count: 0,
            total_actual: 0.0,
            total_predicted: 0.0,
            total_variance: 0.0,
            abs_pct_error_sum: 0.0,
            squared_error_sum: 0.0,
            overpredicted: 0,
            underpredicted: 0,
            high_variance: 0,
            accurate_direction: 0,
            by_severity: BTreeMap::new(),
            by_amount: BTreeMap::new(),
        }
    }

    fn tally(map: &mut BTreeMap<String, AccuracyTally>, key: &str, accurate: bool) {
        let t = map.entry(key.to_string()).or_default();
        t.total += 1;
        if accurate {
            t.accurate += 1;
        }
    }

    fn rates(map: &BTreeMap<String, AccuracyTally>) -> BTreeMap<String, f64> {
        map.iter()
            .map(|(k, t)| (k.clone(), round2(pct_of(t.accurate, t.total))))
            .collect()
    }

    /// A single row, or none when no claims were seen.
    pub fn summary(&self) -> Vec<ModelPerformanceRow> {
        if self.count == 0 {
            return Vec::new();
        }
        let n = self.count as f64;
        vec![ModelPerformanceRow {
            total_claims: self.count,
            avg_actual_settlement: round_amount(self.total_actual / n),
            avg_predicted_settlement: round_amount(self.total_predicted / n),
            overall_variance_pct: round2(self.total_variance / n),
            mape: round2(self.abs_pct_error_sum / n * 100.0),
            rmse: round_amount((self.squared_error_sum / n).sqrt()),
            overprediction_rate: round2(pct_of(self.overpredicted, self.count)),
            underprediction_rate: round2(pct_of(self.underpredicted, self.count)),
            high_variance_rate: round2(pct_of(self.high_variance, self.count)),
            accurate_direction_rate: round2(pct_of(self.accurate_direction, self.count)),
            accuracy_by_severity: Self::rates(&self.by_severity),
            accuracy_by_amount: Self::rates(&self.by_amount),
        }]
    }
}

impl ClaimAggregator for ModelPerformanceAggregator {
    fn name(&self) -> &'static str {
        "model_performance"
    }

    fn file_name(&self) -> &'static str {
        MODEL_PERFORMANCE_FILE
    }

    fn add(&mut self, claim: &Claim) {
        let v = claim.variance_pct;
        let error = claim.actual - claim.predicted;

        self.count += 1;
        self.total_actual += claim.actual;
        self.total_predicted += claim.predicted;
        self.total_variance += v;
        // Zero actuals add nothing but still count in the denominator.
        if claim.actual != 0.0 {
            self.abs_pct_error_sum += (error / claim.actual).abs();
        }
        self.squared_error_sum += error * error;

        if is_overprediction(v, self.threshold) {
            self.overpredicted += 1;
        }
        if is_underprediction(v, self.threshold) {
            self.underpredicted += 1;
        }
        if is_high_variance(v, self.threshold) {
            self.high_variance += 1;
        }
        if prediction_direction(v) == PredictionDirection::Accurate {
            self.accurate_direction += 1;
        }

        let accurate = v.abs() <= self.accuracy_band;
        Self::tally(&mut self.by_severity, &claim.severity, accurate);
        Self::tally(&mut self.by_amount, &claim.amount_category, accurate);
    }

    fn group_count(&self) -> usize {
        usize::from(self.count > 0)
    }

    fn write_summary(&self, out: &mut SummaryWriter) -> AggResult<usize> {
        let rows = self.summary();
        out.write_rows(self.file_name(), &rows)?;
        Ok(rows.len())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
