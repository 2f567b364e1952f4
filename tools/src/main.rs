//! claims-runner: batch aggregation runner for the claims variance dashboard.
//!
//! Usage:
//!   claims-runner
//!   claims-runner --input public/dat.csv --out-dir public --mode streaming
//!   claims-runner --mode in-memory --config engine.json

use anyhow::Result;
use claims_core::{
    config::EngineConfig,
    engine::{run_file, RunMode, RunStats},
    error::AggError,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = arg_value(&args, "--input").unwrap_or("public/dat.csv");
    let out_dir = arg_value(&args, "--out-dir").unwrap_or("public");
    let mode: RunMode = arg_value(&args, "--mode").unwrap_or("streaming").parse()?;
    let config = match arg_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    log::debug!("engine config: {config:?}");

    println!("Claims variance aggregation: claims-runner");
    println!("  input:    {input}");
    println!("  out_dir:  {out_dir}");
    println!("  mode:     {mode:?}");
    println!();

    match run_file(Path::new(input), Path::new(out_dir), mode, config) {
        Ok(stats) => {
            print_summary(&stats);
            Ok(())
        }
        Err(AggError::InputNotFound { path }) => {
            eprintln!("ERROR: {path} not found");
            eprintln!("Place the claims export at that path or pass --input <file>.");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(stats: &RunStats) {
    println!("=== OUTPUT FILES ===");
    for out in &stats.outputs {
        println!("  {:<22} {:>6} rows  {}", out.aggregator, out.rows, out.path.display());
    }
    println!();
    println!("=== PERFORMANCE ===");
    println!("  total claims:    {}", stats.claims);
    println!("  processing time: {:.1}s", stats.elapsed.as_secs_f64());
    println!("  rate:            {:.0} claims/sec", stats.rate_per_sec());
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
