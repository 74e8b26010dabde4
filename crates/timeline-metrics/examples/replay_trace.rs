//! Measure a previously captured trace
//!
//! Usage: cargo run -p timeline-metrics --example replay_trace -- <config.toml> <trace.json> [page]

use anyhow::Result;
use std::env;
use timeline_metrics::capture::{RawTrace, ReplayCapture};
use timeline_metrics::results::ValueData;
use timeline_metrics::{Config, PageResults, TimelineBasedMeasurement};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        anyhow::bail!("Usage: replay_trace <config.toml> <trace.json> [page]");
    }
    let config_path = &args[1];
    let trace_path = &args[2];
    let page = args.get(3).map(String::as_str).unwrap_or("replayed_page");

    println!("Loading config from: {}", config_path);
    let options = Config::from_file(config_path)?.metrics_options()?;
    println!("  Overhead level: {}", options.overhead_level());
    println!(
        "  Extra categories: {}",
        options.extra_category_filters().len()
    );

    println!("Loading trace from: {}", trace_path);
    let mut capture = ReplayCapture::new(RawTrace::from_file(trace_path)?);
    let mut measurement = TimelineBasedMeasurement::new(options);
    let mut results = PageResults::for_page(page);

    measurement.run_user_story(&mut capture, &[], &mut results)?;

    println!();
    println!("Results for {} ({} values):", page, results.len());
    for value in results.values() {
        match &value.data {
            // The raw trace is too large to print
            ValueData::Trace { captured_at, .. } => {
                println!("  {}: <trace captured at {}>", value.name, captured_at)
            }
            data => println!(
                "  {} ({}): {}",
                value.name,
                value.units,
                serde_json::to_string(data)?
            ),
        }
    }

    Ok(())
}
