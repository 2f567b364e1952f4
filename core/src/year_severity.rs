//! Year × severity summary, the chronological trend view.

use crate::{
    aggregator::ClaimAggregator,
    config::EngineConfig,
    error::AggResult,
    group::GroupTable,
    output::SummaryWriter,
    record::Claim,
    types::{Pct, Year},
    variance::{round2, round_amount},
};
use serde::{Deserialize, Serialize};

pub const YEAR_SEVERITY_FILE: &str = "year_severity_summary.csv";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearSeverityKey {
    pub year: Year,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSeverityRow {
    pub year: Year,
    pub severity_category: String,
    pub claim_count: u64,
    pub total_actual_settlement: i64,
    pub total_predicted_settlement: i64,
    pub avg_actual_settlement: i64,
    pub avg_predicted_settlement: i64,
    pub avg_variance_pct: f64,
    pub avg_settlement_days: i64,
    pub overprediction_count: u64,
    pub underprediction_count: u64,
    pub high_variance_count: u64,
}

pub struct YearSeverityAggregator {
    threshold: Pct,
    groups: GroupTable<YearSeverityKey>,
}

impl YearSeverityAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.high_variance_threshold_pct,
            groups: GroupTable::default(),
        }
    }

    /// Rows sorted by year, then severity.
    pub fn summary(&self) -> Vec<YearSeverityRow> {
        // Key order is already (year, severity).
        self.groups
            .iter()
            .map(|(key, g)| YearSeverityRow {
                year: key.year,
                severity_category: key.severity.clone(),
                claim_count: g.count,
                total_actual_settlement: round_amount(g.total_actual),
                total_predicted_settlement: round_amount(g.total_predicted),
                avg_actual_settlement: round_amount(g.mean_of(g.total_actual)),
                avg_predicted_settlement: round_amount(g.mean_of(g.total_predicted)),
                avg_variance_pct: round2(g.avg_variance()),
                avg_settlement_days: round_amount(g.mean_of(g.total_days)),
                overprediction_count: g.overprediction_count(self.threshold),
                underprediction_count: g.underprediction_count(self.threshold),
                high_variance_count: g.high_variance_count(self.threshold),
            })
            .collect()
    }
}

impl ClaimAggregator for YearSeverityAggregator {
    fn name(&self) -> &'static str {
        "year_severity"
    }

    fn file_name(&self) -> &'static str {
        YEAR_SEVERITY_FILE
    }

    fn add(&mut self, claim: &Claim) {
        let key = YearSeverityKey {
            year: claim.year,
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
