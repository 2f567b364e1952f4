//! Streaming aggregation core for claims variance analytics.
//!
//! Reads a claims CSV once and produces the dashboard's summary files:
//! settlement variance by year/severity, county, injury group, adjuster
//! and venue, the ranked variance drivers, and overall model performance.

pub mod adjuster;
pub mod aggregator;
pub mod config;
pub mod county_year;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod group;
pub mod injury_group;
pub mod output;
pub mod performance;
pub mod reader;
pub mod record;
pub mod types;
pub mod variance;
pub mod venue;
pub mod year_severity;
