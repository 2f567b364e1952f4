//! Venue rating × state × county summary, ranked by claim count.

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

pub const VENUE_FILE: &str = "venue_analysis_summary.csv";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VenueKey {
    pub venue_rating: String,
    pub state: String,
    pub county: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRow {
    pub venue_rating: String,
    pub state: String,
    pub county: String,
    pub claim_count: u64,
    pub avg_settlement: i64,
    pub avg_predicted: i64,
    pub avg_variance_pct: f64,
    pub avg_venue_rating_point: f64,
    pub high_variance_pct: f64,
}

pub struct VenueAggregator {
    threshold: Pct,
    groups: GroupTable<VenueKey>,
}

impl VenueAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.high_variance_threshold_pct,
            groups: GroupTable::default(),
        }
    }

    pub fn summary(&self) -> Vec<VenueRow> {
        let mut rows: Vec<VenueRow> = self
            .groups
            .iter()
            .map(|(key, g)| VenueRow {
                venue_rating: key.venue_rating.clone(),
                state: key.state.clone(),
                county: key.county.clone(),
                claim_count: g.count,
                avg_settlement: round_amount(g.mean_of(g.total_actual)),
                avg_predicted: round_amount(g.mean_of(g.total_predicted)),
                avg_variance_pct: round2(g.avg_variance()),
                avg_venue_rating_point: round2(g.mean_of(g.total_venue_point)),
                high_variance_pct: round2(g.high_variance_pct(self.threshold)),
            })
            .collect();
        rows.sort_by_key(|r| Reverse(r.claim_count));
        rows
    }
}

impl ClaimAggregator for VenueAggregator {
    fn name(&self) -> &'static str {
        "venue_analysis"
    }

    fn file_name(&self) -> &'static str {
        VENUE_FILE
    }

    fn add(&mut self, claim: &Claim) {
        let key = VenueKey {
            venue_rating: claim.venue_rating.clone(),
            state: claim.state.clone(),
            county: claim.county.clone(),
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
