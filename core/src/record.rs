//! Claim records and field resolution.
//!
//! A `RawClaim` is one CSV row addressed by header name. The dataset has
//! shipped under several column spellings for the same quantity, so every
//! logical field is read through `FieldResolver` with an ordered list of
//! candidate columns. `Claim` is the fully resolved view handed to the
//! aggregators; it is built once per row.

use crate::{
    config::EngineConfig,
    drivers::Factor,
    types::{Amount, Pct, Year, UNKNOWN},
    variance::variance_pct,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::collections::HashMap;
use std::sync::Arc;

// ── Candidate columns ────────────────────────────────────────────────────────

pub const ACTUAL_COLUMNS: &[&str] = &["DOLLARAMOUNTHIGH", "SETTLEMENTAMOUNT"];
pub const PREDICTED_COLUMNS: &[&str] = &[
    "CAUSATION_HIGH_RECOMMENDATION",
    "CAUSATION__HIGH_RECOMMENDATION",
    "predicted_pain_suffering",
];
pub const VARIANCE_COLUMNS: &[&str] = &["VARIANCE_PERCENTAGE", "variance_pct"];
pub const SETTLEMENT_DAYS_COLUMNS: &[&str] = &["SETTLEMENT_DAYS"];
pub const VENUE_POINT_COLUMNS: &[&str] = &["VENUERATINGPOINT"];
pub const DATE_COLUMNS: &[&str] = &["INCIDENTDATE", "CLAIMCLOSEDATE", "claim_date"];
pub const SEVERITY_COLUMNS: &[&str] = &["INJURY_SEVERITY_CATEGORY", "CAUTION_LEVEL"];
pub const COUNTY_COLUMNS: &[&str] = &["COUNTNAME", "COUNTYNAME"];
pub const STATE_COLUMNS: &[&str] = &["VENUESTATE"];
pub const VENUE_RATING_COLUMNS: &[&str] = &["VENUERATING", "VENUERATINGTEXT", "VENUE_RATING"];
pub const INJURY_GROUP_COLUMNS: &[&str] = &["PRIMARY_INJURYGROUP_CODE"];
pub const BODY_REGION_COLUMNS: &[&str] = &["BODY_REGION"];
pub const ADJUSTER_COLUMNS: &[&str] = &["ADJUSTERNAME"];
pub const CLAIM_ID_COLUMNS: &[&str] = &["CLAIMID", "claim_id"];
pub const AMOUNT_CATEGORY_COLUMNS: &[&str] = &["ACTUAL_SETTLEMENT_CATEGORY"];

// ── Raw rows ─────────────────────────────────────────────────────────────────

/// Column name -> position, shared by every row of one file.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    names: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let mut by_name = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            // First occurrence wins on duplicate headers.
            by_name.entry(name.clone()).or_insert(idx);
        }
        Self { names, by_name }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One input row, addressable by column name.
#[derive(Debug, Clone)]
pub struct RawClaim {
    headers: Arc<HeaderIndex>,
    record: StringRecord,
    line: u64,
}

impl RawClaim {
    pub fn new(headers: Arc<HeaderIndex>, record: StringRecord, line: u64) -> Self {
        Self {
            headers,
            record,
            line,
        }
    }

    /// Build a row from `(column, value)` pairs. Handy for in-memory sources.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let headers = StringRecord::from(pairs.iter().map(|(k, _)| *k).collect::<Vec<_>>());
        let record = StringRecord::from(pairs.iter().map(|(_, v)| *v).collect::<Vec<_>>());
        Self::new(Arc::new(HeaderIndex::new(&headers)), record, 0)
    }

    /// The trimmed value of `column`, or `None` when the column is absent
    /// or the cell is empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .position(column)
            .and_then(|idx| self.record.get(idx))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// 1-based line number in the source file (0 for synthetic rows).
    pub fn line(&self) -> u64 {
        self.line
    }
}

// ── Field resolution ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FieldResolver {
    zero_is_missing: bool,
    fallback_year: Year,
}

impl FieldResolver {
    pub fn new(config: &EngineConfig) -> Self {
        let fallback_year = config
            .fallback_year
            .unwrap_or_else(|| chrono::Local::now().year());
        Self {
            zero_is_missing: config.zero_is_missing,
            fallback_year,
        }
    }

    /// First candidate holding a finite number. Zero falls through to the
    /// next candidate unless `zero_is_missing` is off.
    pub fn numeric(&self, raw: &RawClaim, candidates: &[&str]) -> Option<f64> {
        candidates.iter().find_map(|col| {
            let value = raw.get(col)?.parse::<f64>().ok()?;
            if !value.is_finite() || (self.zero_is_missing && value == 0.0) {
                return None;
            }
            Some(value)
        })
    }

    /// First candidate with a non-empty value.
    pub fn categorical<'a>(&self, raw: &'a RawClaim, candidates: &[&str]) -> Option<&'a str> {
        candidates.iter().find_map(|col| raw.get(col))
    }

    pub fn categorical_or(&self, raw: &RawClaim, candidates: &[&str], default: &str) -> String {
        self.categorical(raw, candidates)
            .unwrap_or(default)
            .to_string()
    }

    /// Year of the first non-empty date candidate, or the fallback year when
    /// that value is missing or unparseable.
    pub fn year(&self, raw: &RawClaim, candidates: &[&str]) -> Year {
        self.categorical(raw, candidates)
            .and_then(parse_year)
            .unwrap_or(self.fallback_year)
    }

    /// Precomputed variance when present and non-zero, otherwise recomputed.
    /// A precomputed 0 always means "recompute".
    pub fn variance(&self, raw: &RawClaim, actual: Amount, predicted: Amount) -> Pct {
        VARIANCE_COLUMNS
            .iter()
            .find_map(|col| {
                raw.get(col)?
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v != 0.0)
            })
            .unwrap_or_else(|| variance_pct(actual, predicted))
    }

    pub fn fallback_year(&self) -> Year {
        self.fallback_year
    }
}

/// Extract the year from the date layouts seen in claim exports.
pub fn parse_year(value: &str) -> Option<Year> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.year());
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d.year());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.year());
        }
    }
    None
}

// ── Resolved claim ───────────────────────────────────────────────────────────

/// A claim with every logical field resolved. Aggregators only see this.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub claim_id: Option<String>,
    pub year: Year,
    pub severity: String,
    pub county: String,
    pub state: String,
    pub venue_rating: String,
    pub injury_group: String,
    pub body_region: String,
    pub adjuster: String,
    pub amount_category: String,
    pub actual: Amount,
    pub predicted: Amount,
    pub variance_pct: Pct,
    pub settlement_days: f64,
    pub venue_point: f64,
    /// Driver factors present on this claim, excluding blanks and "Unknown".
    pub factors: Vec<(Factor, String)>,
}

impl Claim {
    pub fn resolve(raw: &RawClaim, resolver: &FieldResolver) -> Self {
        let actual = resolver.numeric(raw, ACTUAL_COLUMNS).unwrap_or(0.0);
        let predicted = resolver.numeric(raw, PREDICTED_COLUMNS).unwrap_or(0.0);
        let variance_pct = resolver.variance(raw, actual, predicted);

        let factors = Factor::ALL
            .iter()
            .filter_map(|factor| {
                raw.get(factor.column())
                    .filter(|v| *v != UNKNOWN)
                    .map(|v| (*factor, v.to_string()))
            })
            .collect();

        Self {
            claim_id: resolver.categorical(raw, CLAIM_ID_COLUMNS).map(str::to_string),
            year: resolver.year(raw, DATE_COLUMNS),
            severity: resolver.categorical_or(raw, SEVERITY_COLUMNS, UNKNOWN),
            county: resolver.categorical_or(raw, COUNTY_COLUMNS, UNKNOWN),
            state: resolver.categorical_or(raw, STATE_COLUMNS, ""),
            venue_rating: resolver.categorical_or(raw, VENUE_RATING_COLUMNS, UNKNOWN),
            injury_group: resolver.categorical_or(raw, INJURY_GROUP_COLUMNS, UNKNOWN),
            body_region: resolver.categorical_or(raw, BODY_REGION_COLUMNS, UNKNOWN),
            adjuster: resolver.categorical_or(raw, ADJUSTER_COLUMNS, UNKNOWN),
            amount_category: resolver.categorical_or(raw, AMOUNT_CATEGORY_COLUMNS, UNKNOWN),
            actual,
            predicted,
            variance_pct,
            settlement_days: resolver.numeric(raw, SETTLEMENT_DAYS_COLUMNS).unwrap_or(0.0),
            venue_point: resolver.numeric(raw, VENUE_POINT_COLUMNS).unwrap_or(0.0),
            factors,
        }
    }
}
