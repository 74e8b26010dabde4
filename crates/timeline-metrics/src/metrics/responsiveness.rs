//! Metric for interactions flagged `is-responsive`
//!
//! Input latency is recorded by the browser as `InputLatency::<type>` async
//! slices, usually on the browser process rather than the renderer thread
//! that emitted the interaction record, so the whole model is searched for
//! slices overlapping any of the interactions.

use crate::interaction::InteractionRecord;
use crate::results::{ResultsSink, Value};
use crate::trace_model::{ExecutionContext, TraceModel};

use super::{mean, TimelineMetric};

/// Name prefix of input latency slices
pub const INPUT_LATENCY_PREFIX: &str = "InputLatency::";

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponsivenessMetric;

impl TimelineMetric for ResponsivenessMetric {
    fn name(&self) -> &str {
        "responsiveness"
    }

    fn add_results(
        &self,
        model: &TraceModel,
        _context: &ExecutionContext,
        interactions: &[InteractionRecord],
        results: &mut dyn ResultsSink,
    ) -> anyhow::Result<()> {
        let latencies: Vec<f64> = model
            .async_events_named(INPUT_LATENCY_PREFIX)
            .filter(|e| interactions.iter().any(|i| i.overlaps(&e.range())))
            .map(|e| e.range().duration())
            .collect();

        let page = results.current_page().map(str::to_string);
        results.add_value(Value::scalar(
            page.as_deref(),
            "mean_input_event_latency",
            "ms",
            mean(&latencies),
        ));
        results.add_value(Value::list(
            page.as_deref(),
            "input_event_latency",
            "ms",
            latencies,
        ));
        Ok(())
    }
}
