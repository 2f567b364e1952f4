//! County × state × year × venue summary.

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

pub const COUNTY_YEAR_FILE: &str = "county_year_summary.csv";

/// Field order drives the tie-break: year first, then county.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountyYearKey {
    pub year: Year,
    pub county: String,
    pub state: String,
    pub venue_rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyYearRow {
    pub county: String,
    pub state: String,
    pub year: Year,
    pub venue_rating: String,
    pub claim_count: u64,
    pub total_settlement: i64,
    pub avg_settlement: i64,
    pub avg_variance_pct: f64,
    pub high_variance_count: u64,
    pub high_variance_pct: f64,
    pub overprediction_count: u64,
    pub underprediction_count: u64,
}

pub struct CountyYearAggregator {
    threshold: Pct,
    groups: GroupTable<CountyYearKey>,
}

impl CountyYearAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.high_variance_threshold_pct,
            groups: GroupTable::default(),
        }
    }

    /// Rows sorted by year, then county, state and venue rating.
    pub fn summary(&self) -> Vec<CountyYearRow> {
        self.groups
            .iter()
            .map(|(key, g)| CountyYearRow {
                county: key.county.clone(),
                state: key.state.clone(),
                year: key.year,
                venue_rating: key.venue_rating.clone(),
                claim_count: g.count,
                total_settlement: round_amount(g.total_actual),
                avg_settlement: round_amount(g.mean_of(g.total_actual)),
                avg_variance_pct: round2(g.avg_variance()),
                high_variance_count: g.high_variance_count(self.threshold),
                high_variance_pct: round2(g.high_variance_pct(self.threshold)),
                overprediction_count: g.overprediction_count(self.threshold),
                underprediction_count: g.underprediction_count(self.threshold),
            })
            .collect()
    }
}

impl ClaimAggregator for CountyYearAggregator {
    fn name(&self) -> &'static str {
        "county_year"
    }

    fn file_name(&self) -> &'static str {
        COUNTY_YEAR_FILE
    }

    fn add(&mut self, claim: &Claim) {
        let key = CountyYearKey {
            year: claim.year,
            county: claim.county.clone(),
            state: claim.state.clone(),
            venue_rating: claim.venue_rating.clone(),
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
