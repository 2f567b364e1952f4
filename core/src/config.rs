//! Engine configuration.
//!
//! Every field has a default reproducing the reference thresholds, so a
//! partial JSON file only overrides what it names. Without a config file
//! the runner uses `EngineConfig::default()`.

use crate::types::{Pct, Year};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `|variance_pct|` strictly above this is "high variance"; signed
    /// variance beyond ±this is over/under-prediction.
    pub high_variance_threshold_pct: Pct,
    /// Minimum records a (factor, value) pair needs to be reported.
    pub driver_min_support: u64,
    /// Maximum variance-driver rows emitted.
    pub driver_top_n: usize,
    pub driver_high_strength_pct: Pct,
    pub driver_medium_strength_pct: Pct,
    /// `|variance_pct| <= this` counts as accurate in model performance.
    pub accuracy_band_pct: Pct,
    /// Log a progress line every N records. 0 disables progress lines.
    pub progress_interval: u64,
    /// Treat a parsed `0` as absent during numeric field resolution.
    pub zero_is_missing: bool,
    /// Year used when a claim has no parseable date. `None` = current year.
    pub fallback_year: Option<Year>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_variance_threshold_pct: 25.0,
            driver_min_support: 5,
            driver_top_n: 30,
            driver_high_strength_pct: 40.0,
            driver_medium_strength_pct: 25.0,
            accuracy_band_pct: 25.0,
            progress_interval: 10_000,
            zero_is_missing: true,
            fallback_year: None,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Defaults with a pinned fallback year, so tests never depend on the clock.
    pub fn default_test() -> Self {
        Self {
            fallback_year: Some(2000),
            progress_interval: 0,
            ..Self::default()
        }
    }
}
