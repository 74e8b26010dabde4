//! Metric for interactions flagged `is-smooth`
//!
//! Frame times are the gaps between consecutive frame slices that start
//! inside one of the interactions.

use crate::interaction::InteractionRecord;
use crate::results::{ResultsSink, Value};
use crate::trace_model::{ExecutionContext, TraceModel};

use super::{mean, TimelineMetric};

/// Async slice emitted once per presented frame
pub const FRAME_EVENT_NAME: &str = "BenchmarkInstrumentation::DisplayRenderingStats";

/// Frames at or under this interval count as smooth (60 fps plus slack)
const SMOOTH_FRAME_MS: f64 = 17.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothnessMetric;

impl SmoothnessMetric {
    fn frame_times(model: &TraceModel, interactions: &[InteractionRecord]) -> Vec<f64> {
        let mut frame_times = Vec::new();
        for interaction in interactions {
            let mut starts: Vec<f64> = model
                .async_events_named(FRAME_EVENT_NAME)
                .filter(|e| e.name == FRAME_EVENT_NAME)
                .map(|e| e.start)
                .filter(|start| interaction.time_range.contains(*start))
                .collect();
            starts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            frame_times.extend(starts.windows(2).map(|w| w[1] - w[0]));
        }
        frame_times
    }
}

impl TimelineMetric for SmoothnessMetric {
    fn name(&self) -> &str {
        "smoothness"
    }

    fn add_results(
        &self,
        model: &TraceModel,
        _context: &ExecutionContext,
        interactions: &[InteractionRecord],
        results: &mut dyn ResultsSink,
    ) -> anyhow::Result<()> {
        let frame_times = Self::frame_times(model, interactions);
        let percentage_smooth = if frame_times.is_empty() {
            None
        } else {
            let smooth = frame_times.iter().filter(|t| **t <= SMOOTH_FRAME_MS).count();
            Some(100.0 * smooth as f64 / frame_times.len() as f64)
        };

        let page = results.current_page().map(str::to_string);
        results.add_value(Value::scalar(
            page.as_deref(),
            "mean_frame_time",
            "ms",
            mean(&frame_times),
        ));
        results.add_value(Value::scalar(
            page.as_deref(),
            "percentage_smooth",
            "%",
            percentage_smooth,
        ));
        results.add_value(Value::list(page.as_deref(), "frame_times", "ms", frame_times));
        Ok(())
    }
}
