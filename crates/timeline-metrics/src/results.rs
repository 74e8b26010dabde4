//! Result values and sinks
//!
//! Metrics report named [`Value`]s into a [`ResultsSink`]. The dispatcher
//! wraps the caller's sink in a [`LabeledResults`] per interaction label, so
//! that a `frame_times` value reported for the `scroll` label reaches the
//! sink as `scroll-frame_times` and cannot collide with the same metric run
//! over another label.

use serde::{Deserialize, Serialize};

use crate::capture::RawTrace;
use crate::interaction::result_name;

/// Payload of a reported value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueData {
    /// A single number; `None` when the metric had nothing to measure
    Scalar { value: Option<f64> },
    List { values: Vec<f64> },
    /// The raw trace of the cycle, reported once per measurement
    Trace {
        trace: RawTrace,
        /// RFC 3339 timestamp of when the trace value was created
        captured_at: String,
    },
}

/// A named value reported for a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub page: Option<String>,
    pub name: String,
    pub units: String,
    pub data: ValueData,
}

impl Value {
    pub fn scalar(
        page: Option<&str>,
        name: impl Into<String>,
        units: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self {
            page: page.map(str::to_string),
            name: name.into(),
            units: units.into(),
            data: ValueData::Scalar { value },
        }
    }

    pub fn list(
        page: Option<&str>,
        name: impl Into<String>,
        units: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        Self {
            page: page.map(str::to_string),
            name: name.into(),
            units: units.into(),
            data: ValueData::List { values },
        }
    }

    pub fn trace(page: Option<&str>, trace: RawTrace) -> Self {
        Self {
            page: page.map(str::to_string),
            name: "trace".to_string(),
            units: String::new(),
            data: ValueData::Trace {
                trace,
                captured_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match &self.data {
            ValueData::Scalar { value } => *value,
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match &self.data {
            ValueData::List { values } => Some(values),
            _ => None,
        }
    }
}

/// Destination for reported values
pub trait ResultsSink {
    /// Page the values are currently being reported for
    fn current_page(&self) -> Option<&str>;

    fn add_value(&mut self, value: Value);
}

/// Sink decorator that prefixes every value name with an interaction label
pub struct LabeledResults<'a> {
    inner: &'a mut dyn ResultsSink,
    label: &'a str,
}

impl<'a> LabeledResults<'a> {
    pub fn new(inner: &'a mut dyn ResultsSink, label: &'a str) -> Self {
        Self { inner, label }
    }
}

impl ResultsSink for LabeledResults<'_> {
    fn current_page(&self) -> Option<&str> {
        self.inner.current_page()
    }

    fn add_value(&mut self, mut value: Value) {
        value.name = result_name(self.label, &value.name);
        self.inner.add_value(value);
    }
}

/// In-memory sink collecting values in the order they were reported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResults {
    current_page: Option<String>,
    values: Vec<Value>,
}

impl PageResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_page(page: impl Into<String>) -> Self {
        Self {
            current_page: Some(page.into()),
            values: Vec::new(),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn value_named(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.name.as_str()).collect()
    }

    /// Forward every collected value to another sink, in order
    pub fn commit_into(self, sink: &mut dyn ResultsSink) {
        for value in self.values {
            sink.add_value(value);
        }
    }
}

impl ResultsSink for PageResults {
    fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    fn add_value(&mut self, value: Value) {
        self.values.push(value);
    }
}
