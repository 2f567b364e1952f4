//! Injury group × body region × severity summary, ranked by total paid.

use crate::{
    aggregator::ClaimAggregator,
    error::AggResult,
    group::GroupTable,
    output::SummaryWriter,
    record::Claim,
    variance::{round2, round_amount},
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

pub const INJURY_GROUP_FILE: &str = "injury_group_summary.csv";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InjuryGroupKey {
    pub injury_group: String,
    pub body_region: String,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryGroupRow {
    pub injury_group: String,
    pub body_region: String,
    pub severity_category: String,
    pub claim_count: u64,
    pub avg_settlement: i64,
    pub avg_predicted: i64,
    pub avg_variance_pct: f64,
    pub avg_settlement_days: i64,
    pub total_settlement: i64,
}

#[derive(Default)]
pub struct InjuryGroupAggregator {
    groups: GroupTable<InjuryGroupKey>,
}

impl InjuryGroupAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows by total settlement, largest first.
    pub fn summary(&self) -> Vec<InjuryGroupRow> {
        let mut rows: Vec<InjuryGroupRow> = self
            .groups
            .iter()
            .map(|(key, g)| InjuryGroupRow {
                injury_group: key.injury_group.clone(),
                body_region: key.body_region.clone(),
                severity_category: key.severity.clone(),
                claim_count: g.count,
                avg_settlement: round_amount(g.mean_of(g.total_actual)),
                avg_predicted: round_amount(g.mean_of(g.total_predicted)),
                avg_variance_pct: round2(g.avg_variance()),
                avg_settlement_days: round_amount(g.mean_of(g.total_days)),
                total_settlement: round_amount(g.total_actual),
            })
            .collect();
        // Stable: equal totals stay in key order.
        rows.sort_by_key(|r| Reverse(r.total_settlement));
        rows
    }
}

impl ClaimAggregator for InjuryGroupAggregator {
    fn name(&self) -> &'static str {
        "injury_group"
    }

    fn file_name(&self) -> &'static str {
        INJURY_GROUP_FILE
    }

    fn add(&mut self, claim: &Claim) {
        let key = InjuryGroupKey {
            injury_group: claim.injury_group.clone(),
            body_region: claim.body_region.clone(),
            severity: claim.severity.clone(),
        };
        self.groups.add(key, claim);
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
