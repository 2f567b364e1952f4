//! Aggregator trait.
//!
//! RULE: Every summary implements ClaimAggregator.
//! The engine calls add() on each registered aggregator in registration
//! order, once per claim, then write_summary() once at end of stream.
//! Aggregators never see each other's state.

use crate::{error::AggResult, output::SummaryWriter, record::Claim};
use std::any::Any;

/// The contract every aggregator must fulfill.
pub trait ClaimAggregator {
    /// Unique stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Output file this aggregator's summary is written to.
    fn file_name(&self) -> &'static str;

    /// Fold one resolved claim into the running state.
    fn add(&mut self, claim: &Claim);

    /// Number of distinct groups seen so far.
    fn group_count(&self) -> usize;

    /// Stage the summary with `out`. Returns the number of rows written.
    /// The engine commits all staged files together.
    fn write_summary(&self, out: &mut SummaryWriter) -> AggResult<usize>;

    /// For downcasting in tests and tooling only.
    fn as_any(&self) -> &dyn Any;
}
