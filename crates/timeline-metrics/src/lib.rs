//! Timeline based metrics for traced user stories
//!
//! This crate turns a captured trace into metrics chosen by the page under
//! test. The page emits interaction records (async trace events named
//! `Interaction.<label>/<flags>`); the measurement records a trace around the
//! story, validates the records, and runs the metrics their flags select,
//! reporting every value under its interaction label.
//!
//! # Features
//!
//! - **Overhead levels**: pick how much tracing to turn on, or pass a custom
//!   category filter
//! - **Interaction validation**: labels stay on one thread, unrepeatable
//!   labels occur once, repeated labels agree on their flags
//! - **Pluggable metrics**: flags are resolved to metrics through a
//!   replaceable resolver
//! - **Label namespacing**: every value is reported as `<label>-<name>`
//!
//! # Example
//!
//! ```no_run
//! use timeline_metrics::capture::{RawTrace, ReplayCapture};
//! use timeline_metrics::{Config, PageResults, TimelineBasedMeasurement};
//!
//! # fn example() -> anyhow::Result<()> {
//! let options = Config::from_file("measurement.toml")?.metrics_options()?;
//! let mut capture = ReplayCapture::new(RawTrace::from_file("trace.json")?);
//! let mut measurement = TimelineBasedMeasurement::new(options);
//!
//! let mut results = PageResults::for_page("home");
//! measurement.run_user_story(&mut capture, &[], &mut results)?;
//!
//! for value in results.values() {
//!     println!("{}: {:?}", value.name, value.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod category_filter;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod interaction;
pub mod measurement;
pub mod metrics;
pub mod page_test;
pub mod results;
pub mod trace_model;

// Re-export main types for convenience
pub use category_filter::{CategoryFilter, OverheadLevel, OverheadSetting};
pub use config::{Config, MetricsOptions};
pub use error::MeasurementError;
pub use interaction::InteractionRecord;
pub use measurement::TimelineBasedMeasurement;
pub use results::{PageResults, ResultsSink, Value};
