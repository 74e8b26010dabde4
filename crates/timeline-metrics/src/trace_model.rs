//! In-memory trace model consumed by extraction and metric plugins
//!
//! Turning a raw trace into this model is the job of a [`TraceModelBuilder`].
//! The crate ships [`JsonModelBuilder`], which expects the raw trace payload
//! to already be a serialized [`TraceModel`]:
//!
//! ```json
//! {
//!   "contexts": [
//!     {
//!       "id": { "pid": 1, "tid": 7 },
//!       "name": "CrRendererMain",
//!       "async_events": [
//!         { "name": "Interaction.scroll/is-smooth", "start": 10.0, "end": 250.0 }
//!       ]
//!     }
//!   ]
//! }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capture::RawTrace;

/// Identity of an execution context (a thread within a process)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId {
    pub pid: i64,
    pub tid: i64,
}

impl ContextId {
    pub fn new(pid: i64, tid: i64) -> Self {
        Self { pid, tid }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pid, self.tid)
    }
}

/// Closed interval of trace timestamps, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the two ranges share at least one instant
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// An async slice recorded on an execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncEvent {
    pub name: String,
    pub start: f64,
    pub end: f64,
    /// Context the event ended on, when it differs from the one it started on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_context: Option<ContextId>,
}

impl AsyncEvent {
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            end_context: None,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// One thread's worth of trace data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub id: ContextId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Async events in trace order
    #[serde(default)]
    pub async_events: Vec<AsyncEvent>,
}

impl ExecutionContext {
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            name: None,
            async_events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: AsyncEvent) -> Self {
        self.async_events.push(event);
        self
    }
}

/// A built trace: execution contexts in the order the trace reports them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceModel {
    #[serde(default)]
    pub contexts: Vec<ExecutionContext>,
}

impl TraceModel {
    pub fn new(contexts: Vec<ExecutionContext>) -> Self {
        Self { contexts }
    }

    /// Every async event in the model whose name starts with `prefix`
    pub fn async_events_named<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a AsyncEvent> + 'a {
        self.contexts
            .iter()
            .flat_map(|c| c.async_events.iter())
            .filter(move |e| e.name.starts_with(prefix))
    }
}

/// Builds a [`TraceModel`] from a captured raw trace
pub trait TraceModelBuilder {
    fn build(&self, raw: &RawTrace) -> anyhow::Result<TraceModel>;
}

/// Builder for raw traces whose payload is a serialized [`TraceModel`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelBuilder;

impl TraceModelBuilder for JsonModelBuilder {
    fn build(&self, raw: &RawTrace) -> anyhow::Result<TraceModel> {
        TraceModel::deserialize(&raw.data).context("Failed to build trace model from raw trace")
    }
}
