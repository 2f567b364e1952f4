//! Per-group running accumulator shared by the five dimensional summaries.
//!
//! Variances are kept per record: the over/under/high-variance counts need
//! the distribution, not just its mean.

use crate::{
    record::Claim,
    types::Pct,
    variance::{is_high_variance, is_overprediction, is_underprediction, pct_of},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupAccumulator {
    pub count: u64,
    pub total_actual: f64,
    pub total_predicted: f64,
    pub total_days: f64,
    pub total_venue_point: f64,
    pub variances: Vec<Pct>,
}

impl GroupAccumulator {
    pub fn add(&mut self, claim: &Claim) {
        self.count += 1;
        self.total_actual += claim.actual;
        self.total_predicted += claim.predicted;
        self.total_days += claim.settlement_days;
        self.total_venue_point += claim.venue_point;
        self.variances.push(claim.variance_pct);
    }

    /// `total / count`, 0 for an empty group.
    pub fn mean_of(&self, total: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        total / self.count as f64
    }

    pub fn avg_variance(&self) -> Pct {
        self.mean_of(self.variances.iter().sum())
    }

    pub fn high_variance_count(&self, threshold: Pct) -> u64 {
        self.count_where(|v| is_high_variance(v, threshold))
    }

    pub fn overprediction_count(&self, threshold: Pct) -> u64 {
        self.count_where(|v| is_overprediction(v, threshold))
    }

    pub fn underprediction_count(&self, threshold: Pct) -> u64 {
        self.count_where(|v| is_underprediction(v, threshold))
    }

    pub fn high_variance_pct(&self, threshold: Pct) -> Pct {
        pct_of(self.high_variance_count(threshold), self.count)
    }

    fn count_where(&self, pred: impl Fn(Pct) -> bool) -> u64 {
        self.variances.iter().filter(|v| pred(**v)).count() as u64
    }
}

/// Groups keyed by a typed composite key. `BTreeMap` keeps iteration in
/// key order, so ties after a summary's primary sort are deterministic.
#[derive(Debug, Clone)]
pub struct GroupTable<K: Ord> {
    groups: BTreeMap<K, GroupAccumulator>,
}

impl<K: Ord> Default for GroupTable<K> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<K: Ord> GroupTable<K> {
    pub fn add(&mut self, key: K, claim: &Claim) {
        self.groups.entry(key).or_default().add(claim);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&GroupAccumulator> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &GroupAccumulator)> {
        self.groups.iter()
    }
}
