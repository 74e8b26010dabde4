//! Trace building helpers shared by the integration tests

#![allow(dead_code)]

use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use timeline_metrics::capture::RawTrace;
use timeline_metrics::error::Result;
use timeline_metrics::metrics::{metrics_from_flags, FlagsResolver, TimelineMetric};
use timeline_metrics::trace_model::{ExecutionContext, TraceModel};
use timeline_metrics::{InteractionRecord, ResultsSink};

/// Raw trace with one execution context per `(tid, markers)` entry
///
/// Markers are laid out 100ms apart, each lasting 50ms.
pub fn raw_trace(contexts: &[(i64, &[&str])]) -> RawTrace {
    let contexts: Vec<_> = contexts
        .iter()
        .map(|(tid, markers)| {
            let events: Vec<_> = markers
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let start = i as f64 * 100.0;
                    json!({ "name": name, "start": start, "end": start + 50.0 })
                })
                .collect();
            json!({ "id": { "pid": 1, "tid": tid }, "async_events": events })
        })
        .collect();
    RawTrace::new(json!({ "contexts": contexts }))
}

/// One metric invocation seen by a [`CountingMetric`]
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub metric: String,
    pub tid: i64,
    pub group_size: usize,
}

pub type InvocationLog = Arc<Mutex<Vec<Invocation>>>;

/// Wraps a metric and logs every call to it
#[derive(Debug)]
pub struct CountingMetric {
    inner: Box<dyn TimelineMetric>,
    log: InvocationLog,
}

impl TimelineMetric for CountingMetric {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn add_results(
        &self,
        model: &TraceModel,
        context: &ExecutionContext,
        interactions: &[InteractionRecord],
        results: &mut dyn ResultsSink,
    ) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(Invocation {
            metric: self.inner.name().to_string(),
            tid: context.id.tid,
            group_size: interactions.len(),
        });
        self.inner.add_results(model, context, interactions, results)
    }
}

/// Default resolver whose metrics log their invocations
pub fn counting_resolver() -> (FlagsResolver, InvocationLog) {
    let log: InvocationLog = Arc::default();
    let resolver_log = log.clone();
    let resolver: FlagsResolver = Arc::new(
        move |flags: &BTreeSet<String>| -> Result<Vec<Box<dyn TimelineMetric>>> {
            Ok(metrics_from_flags(flags)?
                .into_iter()
                .map(|inner| {
                    Box::new(CountingMetric {
                        inner,
                        log: resolver_log.clone(),
                    }) as Box<dyn TimelineMetric>
                })
                .collect())
        },
    );
    (resolver, log)
}
