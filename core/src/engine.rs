//! The aggregation engine: one pass over the claims, many summaries.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Year × severity
//!   2. County × year
//!   3. Injury group
//!   4. Adjuster performance
//!   5. Venue analysis
//!   6. Variance drivers
//!   7. Model performance
//!
//! RULES:
//!   - Each raw row is resolved into a Claim exactly once.
//!   - Every aggregator sees every claim, in file order, before the next
//!     row is pulled.
//!   - Aggregators own their state; nothing is shared between them.
//!   - Summaries are written only after the stream ends cleanly. A read
//!     error leaves the previous outputs untouched.

use crate::{
    adjuster::AdjusterAggregator,
    aggregator::ClaimAggregator,
    config::EngineConfig,
    county_year::CountyYearAggregator,
    drivers::VarianceDriverAggregator,
    error::{AggError, AggResult},
    injury_group::InjuryGroupAggregator,
    output::SummaryWriter,
    performance::ModelPerformanceAggregator,
    reader::ClaimReader,
    record::{Claim, FieldResolver, RawClaim},
    venue::VenueAggregator,
    year_severity::YearSeverityAggregator,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// How records reach the engine. Both modes share the same aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Pull rows lazily from disk.
    #[default]
    Streaming,
    /// Load every row first, then aggregate.
    InMemory,
}

impl FromStr for RunMode {
    type Err = AggError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streaming" => Ok(Self::Streaming),
            "in-memory" | "in_memory" => Ok(Self::InMemory),
            other => Err(anyhow::anyhow!("Unknown run mode '{other}'").into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputReport {
    pub aggregator: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct RunStats {
    pub claims: u64,
    pub elapsed: Duration,
    pub outputs: Vec<OutputReport>,
}

impl RunStats {
    pub fn rate_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.claims as f64 / secs
        } else {
            0.0
        }
    }
}

pub struct SummaryEngine {
    config: EngineConfig,
    resolver: FieldResolver,
    aggregators: Vec<Box<dyn ClaimAggregator>>,
    claims_seen: u64,
    started: Instant,
}

impl SummaryEngine {
    /// An engine with no aggregators registered.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            resolver: FieldResolver::new(&config),
            config,
            aggregators: Vec::new(),
            claims_seen: 0,
            started: Instant::now(),
        }
    }

    /// Build a fully wired engine with every summary registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: EngineConfig) -> Self {
        let mut engine = SummaryEngine::new(config);
        let cfg = engine.config.clone();

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(Box::new(YearSeverityAggregator::new(&cfg)));
        engine.register(Box::new(CountyYearAggregator::new(&cfg)));
        engine.register(Box::new(InjuryGroupAggregator::new()));
        engine.register(Box::new(AdjusterAggregator::new(&cfg)));
        engine.register(Box::new(VenueAggregator::new(&cfg)));
        engine.register(Box::new(VarianceDriverAggregator::new(&cfg)));
        engine.register(Box::new(ModelPerformanceAggregator::new(&cfg)));
        log::debug!("Undated claims fall back to {}", engine.resolver.fallback_year());
        engine
    }

    /// Register an aggregator. Call in the documented execution order.
    pub fn register(&mut self, aggregator: Box<dyn ClaimAggregator>) {
        self.aggregators.push(aggregator);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn claims_seen(&self) -> u64 {
        self.claims_seen
    }

    /// Resolve one row and hand it to every aggregator.
    pub fn add(&mut self, raw: &RawClaim) {
        let claim = Claim::resolve(raw, &self.resolver);
        log::trace!("line {}: {} / {}", raw.line(), claim.year, claim.severity);
        self.add_claim(&claim);
    }

    pub fn add_claim(&mut self, claim: &Claim) {
        for aggregator in self.aggregators.iter_mut() {
            aggregator.add(claim);
        }
        self.claims_seen += 1;

        let interval = self.config.progress_interval;
        if interval > 0 && self.claims_seen.is_multiple_of(interval) {
            self.log_progress();
        }
    }

    /// Feed a whole record source. Stops at the first error.
    pub fn consume<I>(&mut self, records: I) -> AggResult<u64>
    where
        I: IntoIterator<Item = AggResult<RawClaim>>,
    {
        let before = self.claims_seen;
        for record in records {
            self.add(&record?);
        }
        Ok(self.claims_seen - before)
    }

    /// Downcast a registered aggregator. Used by tests and tooling.
    pub fn aggregator<T: 'static>(&self) -> Option<&T> {
        self.aggregators
            .iter()
            .find_map(|a| a.as_any().downcast_ref::<T>())
    }

    /// Write every summary and consume the engine. The files replace the
    /// previous outputs together, or not at all.
    pub fn finalize(self, out: &mut SummaryWriter) -> AggResult<Vec<OutputReport>> {
        log::info!("Generating summaries from {} claims", self.claims_seen);
        let mut reports = Vec::with_capacity(self.aggregators.len());
        for aggregator in &self.aggregators {
            let rows = match aggregator.write_summary(out) {
                Ok(rows) => rows,
                Err(e) => {
                    log::error!("{} failed: {e}", aggregator.name());
                    out.discard();
                    return Err(e);
                }
            };
            let path = out.path_for(aggregator.file_name());
            log::info!(
                "{}: {} rows ({} groups) -> {}",
                aggregator.name(),
                rows,
                aggregator.group_count(),
                path.display()
            );
            reports.push(OutputReport {
                aggregator: aggregator.name(),
                path,
                rows,
            });
        }
        out.commit()?;
        log::info!("{} summaries written to {}", reports.len(), out.out_dir().display());
        Ok(reports)
    }

    fn log_progress(&self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.claims_seen as f64 / elapsed
        } else {
            0.0
        };
        log::info!(
            "Processed: {} claims | Rate: {:.0}/sec | Time: {:.1}s",
            self.claims_seen,
            rate,
            elapsed
        );
    }
}

/// Aggregate `input` into the summary files under `out_dir`.
///
/// A missing input is `AggError::InputNotFound`, checked before anything
/// else touches the disk.
pub fn run_file(
    input: &Path,
    out_dir: &Path,
    mode: RunMode,
    config: EngineConfig,
) -> AggResult<RunStats> {
    if !input.exists() {
        return Err(AggError::InputNotFound {
            path: input.display().to_string(),
        });
    }
    let size_mb = std::fs::metadata(input)?.len() as f64 / 1024.0 / 1024.0;
    log::info!("File: {} ({size_mb:.2} MB), mode {mode:?}", input.display());

    let started = Instant::now();
    let mut engine = SummaryEngine::build(config);
    let reader = ClaimReader::open(input)?;

    let claims = match mode {
        RunMode::Streaming => engine.consume(reader)?,
        RunMode::InMemory => {
            let rows = reader.read_all()?;
            log::info!("Loaded {} claims into memory", rows.len());
            engine.consume(rows.into_iter().map(Ok))?
        }
    };
    engine.log_progress();

    let mut writer = SummaryWriter::new(out_dir)?;
    let outputs = engine.finalize(&mut writer)?;

    Ok(RunStats {
        claims,
        elapsed: started.elapsed(),
        outputs,
    })
}
