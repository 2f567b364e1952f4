//! Shared primitive types used across the aggregation engine.

/// A calendar year extracted from a claim date.
pub type Year = i32;

/// A monetary amount in dollars. Kept as f64 to match the source data.
pub type Amount = f64;

/// A signed percentage, e.g. `25.0` for +25%.
pub type Pct = f64;

/// Categorical fallback used when no candidate column holds a value.
pub const UNKNOWN: &str = "Unknown";
