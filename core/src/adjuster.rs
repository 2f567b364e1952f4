//! Adjuster performance summary, ranked by caseload.

use crate::{
    aggregator::ClaimAggregator,
    config::EngineConfig,
    error::AggResult,
    group::GroupTable,
    output::SummaryWriter,
    record::Claim,
    types::Pct,
    variance::{round2, round_amount},
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

pub const ADJUSTER_FILE: &str = "adjuster_performance_summary.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjusterRow {
    pub adjuster_name: String,
    pub claim_count: u64,
    pub avg_actual_settlement: i64,
    pub avg_predicted_settlement: i64,
    pub avg_variance_pct: f64,
    pub high_variance_count: u64,
    pub high_variance_pct: f64,
    pub overprediction_count: u64,
    pub underprediction_count: u64,
    pub avg_settlement_days: i64,
}

pub struct AdjusterAggregator {
    threshold: Pct,
    /// Single-dimension key: the adjuster name itself.
    groups: GroupTable<String>,
}

impl AdjusterAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.high_variance_threshold_pct,
            groups: GroupTable::default(),
        }
    }

    /// Rows by claim count, busiest adjuster first; ties by name.
    pub fn summary(&self) -> Vec<AdjusterRow> {
        let mut rows: Vec<AdjusterRow> = self
            .groups
            .iter()
            .map(|(name, g)| AdjusterRow {
                adjuster_name: name.clone(),
                claim_count: g.count,
                avg_actual_settlement: round_amount(g.mean_of(g.total_actual)),
                avg_predicted_settlement: round_amount(g.mean_of(g.total_predicted)),
                avg_variance_pct: round2(g.avg_variance()),
                high_variance_count: g.high_variance_count(self.threshold),
                high_variance_pct: round2(g.high_variance_pct(self.threshold)),
                overprediction_count: g.overprediction_count(self.threshold),
                underprediction_count: g.underprediction_count(self.threshold),
                avg_settlement_days: round_amount(g.mean_of(g.total_days)),
            })
            .collect();
        rows.sort_by_key(|r| Reverse(r.claim_count));
        rows
    }
}

impl ClaimAggregator for AdjusterAggregator {
    fn name(&self) -> &'static str {
        "adjuster_performance"
    }

    fn file_name(&self) -> &'static str {
        ADJUSTER_FILE
    }

    fn add(&mut self, claim: &Claim) {
        self.groups.add(claim.adjuster.clone(), claim);
    }

    fn group_count(&self) -> usize {
        self.groups.len()
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
