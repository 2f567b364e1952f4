//! Variance-driver analysis.
//!
//! Each claim fans out into one group per present categorical factor,
//! keyed by (factor, value). At finalization pairs below the minimum
//! support are dropped, the rest are ranked by contribution score:
//!
//!   contribution = mean |variance| × (pair count / total claims)
//!
//! so a rare but extreme value cannot dominate the ranking.

use crate::{
    aggregator::ClaimAggregator,
    config::EngineConfig,
    error::AggResult,
    output::SummaryWriter,
    record::Claim,
    types::Pct,
    variance::round2,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VARIANCE_DRIVERS_FILE: &str = "variance_drivers_analysis.csv";

/// The tracked categorical factors. Declaration order is the tie-break
/// order in the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Factor {
    InjuryExtent,
    TreatmentCourse,
    PainManagement,
    PhysicalTherapy,
    VehicleImpact,
    EmergencyTreatment,
    PriorTreatment,
    InjurySeverity,
    BodyRegion,
    ConsistentMechanism,
    TreatmentDelays,
}

impl Factor {
    pub const ALL: [Factor; 11] = [
        Factor::InjuryExtent,
        Factor::TreatmentCourse,
        Factor::PainManagement,
        Factor::PhysicalTherapy,
        Factor::VehicleImpact,
        Factor::EmergencyTreatment,
        Factor::PriorTreatment,
        Factor::InjurySeverity,
        Factor::BodyRegion,
        Factor::ConsistentMechanism,
        Factor::TreatmentDelays,
    ];

    /// Source column in the input file.
    pub fn column(&self) -> &'static str {
        match self {
            Self::InjuryExtent        => "Injury_Extent",
            Self::TreatmentCourse     => "Treatment_Course",
            Self::PainManagement      => "Pain_Management",
            Self::PhysicalTherapy     => "Physical_Therapy",
            Self::VehicleImpact       => "Vehicle_Impact",
            Self::EmergencyTreatment  => "Emergency_Treatment",
            Self::PriorTreatment      => "Prior_Treatment",
            Self::InjurySeverity      => "INJURY_SEVERITY_CATEGORY",
            Self::BodyRegion          => "BODY_REGION",
            Self::ConsistentMechanism => "Consistent_Mechanism",
            Self::TreatmentDelays     => "Treatment_Delays",
        }
    }

    /// Display name written to the `factor_name` column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InjuryExtent        => "Injury Extent",
            Self::TreatmentCourse     => "Treatment Course",
            Self::PainManagement      => "Pain Management",
            Self::PhysicalTherapy     => "Physical Therapy",
            Self::VehicleImpact       => "Vehicle Impact",
            Self::EmergencyTreatment  => "Emergency Treatment",
            Self::PriorTreatment      => "Prior Treatment",
            Self::InjurySeverity      => "Injury Severity",
            Self::BodyRegion          => "Body Region",
            Self::ConsistentMechanism => "Consistent Mechanism",
            Self::TreatmentDelays     => "Treatment Delays",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriverKey {
    pub factor: Factor,
    pub value: String,
}

/// Mean absolute variance is all the ranking needs, so no variance list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverAccumulator {
    pub count: u64,
    pub total_abs_variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceDriverRow {
    pub factor_name: String,
    pub factor_value: String,
    pub claim_count: u64,
    pub avg_variance_pct: f64,
    pub contribution_score: f64,
    pub correlation_strength: CorrelationStrength,
}

pub struct VarianceDriverAggregator {
    min_support: u64,
    top_n: usize,
    high_strength: Pct,
    medium_strength: Pct,
    total_claims: u64,
    groups: BTreeMap<DriverKey, DriverAccumulator>,
}

impl VarianceDriverAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_support: config.driver_min_support,
            top_n: config.driver_top_n,
            high_strength: config.driver_high_strength_pct,
            medium_strength: config.driver_medium_strength_pct,
            total_claims: 0,
            groups: BTreeMap::new(),
        }
    }

    /// Claims seen, counted once per claim regardless of factor fan-out.
    pub fn total_claims(&self) -> u64 {
        self.total_claims
    }

    pub fn group(&self, factor: Factor, value: &str) -> Option<&DriverAccumulator> {
        self.groups.get(&DriverKey {
            factor,
            value: value.to_string(),
        })
    }

    fn strength(&self, avg: Pct) -> CorrelationStrength {
        if avg > self.high_strength {
            CorrelationStrength::High
        } else if avg > self.medium_strength {
            CorrelationStrength::Medium
        } else {
            CorrelationStrength::Low
        }
    }

    /// Supported pairs ranked by contribution score, truncated to top-N.
    pub fn summary(&self) -> Vec<VarianceDriverRow> {
        let mut scored: Vec<(f64, &DriverKey, &DriverAccumulator)> = self
            .groups
            .iter()
            .filter(|(_, g)| g.count >= self.min_support && g.count > 0)
            .map(|(key, g)| {
                let avg = g.total_abs_variance / g.count as f64;
                let frequency = if self.total_claims == 0 {
                    0.0
                } else {
                    g.count as f64 / self.total_claims as f64
                };
                (avg * frequency, key, g)
            })
            .collect();

        // Stable sort: equal scores keep key order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.top_n);

        scored
            .into_iter()
            .map(|(score, key, g)| {
                let avg = g.total_abs_variance / g.count as f64;
                VarianceDriverRow {
                    factor_name: key.factor.label().to_string(),
                    factor_value: key.value.clone(),
                    claim_count: g.count,
                    avg_variance_pct: round2(avg),
                    contribution_score: round2(score),
                    correlation_strength: self.strength(avg),
                }
            })
            .collect()
    }
}

impl ClaimAggregator for VarianceDriverAggregator {
    fn name(&self) -> &'static str {
        "variance_drivers"
    }

    fn file_name(&self) -> &'static str {
        VARIANCE_DRIVERS_FILE
    }

    fn add(&mut self, claim: &Claim) {
        self.total_claims += 1;
        let abs_variance = claim.variance_pct.abs();
        for (factor, value) in &claim.factors {
            let group = self
                .groups
                .entry(DriverKey {
                    factor: *factor,
                    value: value.clone(),
                })
                .or_default();
            group.count += 1;
            group.total_abs_variance += abs_variance;
        }
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
