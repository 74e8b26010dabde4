//! Metric for interactions flagged `is-fast`
//!
//! Reports how long the interactions took, end to end.

use crate::interaction::InteractionRecord;
use crate::results::{ResultsSink, Value};
use crate::trace_model::{ExecutionContext, TraceModel};

use super::TimelineMetric;

#[derive(Debug, Clone, Copy, Default)]
pub struct FastMetric;

impl TimelineMetric for FastMetric {
    fn name(&self) -> &str {
        "fast"
    }

    fn add_results(
        &self,
        _model: &TraceModel,
        _context: &ExecutionContext,
        interactions: &[InteractionRecord],
        results: &mut dyn ResultsSink,
    ) -> anyhow::Result<()> {
        let durations: Vec<f64> = interactions.iter().map(|i| i.duration()).collect();
        let total = durations.iter().sum::<f64>();
        let max = durations.iter().copied().fold(None, |acc: Option<f64>, d| {
            Some(acc.map_or(d, |a| a.max(d)))
        });

        let page = results.current_page().map(str::to_string);
        results.add_value(Value::scalar(page.as_deref(), "fast-duration", "ms", Some(total)));
        results.add_value(Value::scalar(page.as_deref(), "fast-max_duration", "ms", max));
        Ok(())
    }
}
