//! Timeline based measurement lifecycle
//!
//! A timeline based measurement moves the choice of what to measure onto
//! the page under test. The page issues interaction records describing what
//! it is doing and which flags apply; the measurement records one trace
//! covering the story and hands each interaction to the metrics its flags
//! select. A single run can therefore yield load timing, smoothness and
//! input latency for different parts of the same story.
//!
//! # Lifecycle
//!
//! ```text
//!   will_run_user_story ──▶ measure ──▶ did_run_user_story
//!   (resolve filter,        (stop, build model,   (stop capture if
//!    start capture)          extract, dispatch)    still running)
//! ```
//!
//! `did_run_user_story` must run even if `measure` failed or was skipped;
//! [`TimelineBasedMeasurement::run_user_story`] runs all three phases and
//! always cleans up.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use timeline_metrics::capture::{RawTrace, ReplayCapture};
//! use timeline_metrics::config::MetricsOptions;
//! use timeline_metrics::measurement::TimelineBasedMeasurement;
//! use timeline_metrics::results::PageResults;
//!
//! let trace = RawTrace::new(json!({
//!     "contexts": [{
//!         "id": { "pid": 1, "tid": 1 },
//!         "async_events": [
//!             { "name": "Interaction.tap/is-fast", "start": 0.0, "end": 40.0 }
//!         ]
//!     }]
//! }));
//! let mut capture = ReplayCapture::new(trace);
//! let mut measurement = TimelineBasedMeasurement::new(MetricsOptions::default());
//! let mut results = PageResults::for_page("home");
//!
//! measurement.run_user_story(&mut capture, &[], &mut results)?;
//! assert!(results.value_named("tap-fast-duration").is_some());
//! # Ok::<(), timeline_metrics::MeasurementError>(())
//! ```

use tracing::{debug, info, instrument, warn};

use crate::capture::{CaptureOptions, TraceCapture};
use crate::category_filter::resolve_category_filter;
use crate::config::MetricsOptions;
use crate::dispatcher::{dispatch, extract_by_context};
use crate::error::{MeasurementError, Result};
use crate::results::{PageResults, ResultsSink, Value};
use crate::trace_model::{JsonModelBuilder, TraceModelBuilder};

/// Where the measurement is in its current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Measured,
}

/// Collects metrics for a user story based on its interaction records
pub struct TimelineBasedMeasurement<B = JsonModelBuilder> {
    options: MetricsOptions,
    model_builder: B,
    phase: Phase,
}

impl TimelineBasedMeasurement<JsonModelBuilder> {
    pub fn new(options: MetricsOptions) -> Self {
        Self::with_model_builder(options, JsonModelBuilder)
    }
}

impl<B: TraceModelBuilder> TimelineBasedMeasurement<B> {
    pub fn with_model_builder(options: MetricsOptions, model_builder: B) -> Self {
        Self {
            options,
            model_builder,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Configure and start tracing
    ///
    /// `synthetic_delays` are attached to the category filter verbatim, for
    /// example `DELAY(cc.BeginMainFrame;0.014;alternating)`.
    ///
    /// # Errors
    ///
    /// - [`MeasurementError::Unsupported`] if the driver cannot capture traces
    /// - [`MeasurementError::Capture`] if starting the capture fails
    #[instrument(skip_all, fields(overhead = %self.options.overhead_level()))]
    pub fn will_run_user_story(
        &mut self,
        capture: &mut dyn TraceCapture,
        synthetic_delays: &[String],
    ) -> Result<()> {
        if !capture.supports_capture() {
            return Err(MeasurementError::Unsupported(
                "driver cannot capture traces".to_string(),
            ));
        }
        if self.phase == Phase::Capturing {
            warn!("Starting a capture while the previous one was never measured");
        }

        let filter = resolve_category_filter(
            self.options.overhead_level(),
            self.options.extra_category_filters(),
            synthetic_delays,
        );
        debug!(
            "Starting capture with {} included categories and {} synthetic delays",
            filter.included.len(),
            filter.synthetic_delays.len()
        );

        capture
            .start(&CaptureOptions::default(), &filter)
            .map_err(MeasurementError::Capture)?;
        self.phase = Phase::Capturing;
        Ok(())
    }

    /// Stop tracing and report every metric the interaction records ask for
    ///
    /// The raw trace is reported as a `trace` value ahead of the metric
    /// values. Values are only forwarded to `results` once the whole trace
    /// has been validated and measured, so a failed cycle reports nothing.
    ///
    /// # Errors
    ///
    /// Any capture, model building, extraction or dispatch error.
    #[instrument(skip_all)]
    pub fn measure(
        &mut self,
        capture: &mut dyn TraceCapture,
        results: &mut dyn ResultsSink,
    ) -> Result<()> {
        let raw = capture.stop().map_err(MeasurementError::Capture)?;
        self.phase = Phase::Measured;

        let page = results.current_page().map(str::to_string);
        let mut staged = match &page {
            Some(page) => PageResults::for_page(page.as_str()),
            None => PageResults::new(),
        };
        staged.add_value(Value::trace(page.as_deref(), raw.clone()));

        let model = self
            .model_builder
            .build(&raw)
            .map_err(MeasurementError::Capture)?;
        let groups = extract_by_context(&model)?;
        dispatch(&model, &groups, self.options.flags_resolver(), &mut staged)?;

        info!(
            "Measured {} interaction contexts, reporting {} values",
            groups.len(),
            staged.len()
        );
        staged.commit_into(results);
        Ok(())
    }

    /// Stop tracing if it is still running; never fails
    #[instrument(skip_all)]
    pub fn did_run_user_story(&mut self, capture: &mut dyn TraceCapture) {
        if capture.is_running() {
            debug!("Capture still running after the story, stopping it");
            if let Err(e) = capture.stop() {
                warn!("Failed to stop capture during cleanup: {:#}", e);
            }
        }
        self.phase = Phase::Idle;
    }

    /// Run a whole measurement cycle
    ///
    /// Cleanup runs whatever the outcome of the first two phases.
    pub fn run_user_story(
        &mut self,
        capture: &mut dyn TraceCapture,
        synthetic_delays: &[String],
        results: &mut dyn ResultsSink,
    ) -> Result<()> {
        let outcome = match self.will_run_user_story(capture, synthetic_delays) {
            Ok(()) => self.measure(capture, results),
            Err(e) => Err(e),
        };
        self.did_run_user_story(capture);
        outcome
    }
}
