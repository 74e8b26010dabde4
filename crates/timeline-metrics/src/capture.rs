//! Trace capture service interface
//!
//! The coordinator never talks to a browser directly. It drives a
//! [`TraceCapture`] implementation through start/stop and hands whatever
//! [`RawTrace`] comes back to a model builder.
//!
//! [`ReplayCapture`] is a capture service that "records" a trace captured
//! earlier, which is what the tests and the `replay_trace` example use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

use crate::category_filter::CategoryFilter;

/// Opaque trace payload returned by the capture service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    pub data: serde_json::Value,
}

impl RawTrace {
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// Load a raw trace from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {}", path.display()))?;
        let data = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse trace file: {}", path.display()))?;
        Ok(Self { data })
    }
}

/// Which trace sources the capture service should turn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub enable_chrome_trace: bool,
    pub enable_platform_display_trace: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            enable_chrome_trace: true,
            enable_platform_display_trace: true,
        }
    }
}

/// The external service that starts and stops trace capture
pub trait TraceCapture {
    /// Whether this driver can capture traces at all
    fn supports_capture(&self) -> bool;

    fn start(&mut self, options: &CaptureOptions, filter: &CategoryFilter) -> Result<()>;

    fn stop(&mut self) -> Result<RawTrace>;

    fn is_running(&self) -> bool;
}

/// Capture service that replays a pre-recorded trace
///
/// The filter of the last `start` call is kept so callers can check what
/// would have been requested from a live browser.
#[derive(Debug, Clone)]
pub struct ReplayCapture {
    trace: RawTrace,
    running: bool,
    supported: bool,
    last_filter: Option<CategoryFilter>,
    starts: u32,
    stops: u32,
}

impl ReplayCapture {
    pub fn new(trace: RawTrace) -> Self {
        Self {
            trace,
            running: false,
            supported: true,
            last_filter: None,
            starts: 0,
            stops: 0,
        }
    }

    /// A replay driver that reports it cannot capture
    pub fn unsupported(trace: RawTrace) -> Self {
        Self {
            supported: false,
            ..Self::new(trace)
        }
    }

    pub fn last_filter(&self) -> Option<&CategoryFilter> {
        self.last_filter.as_ref()
    }

    pub fn start_count(&self) -> u32 {
        self.starts
    }

    pub fn stop_count(&self) -> u32 {
        self.stops
    }
}

impl TraceCapture for ReplayCapture {
    fn supports_capture(&self) -> bool {
        self.supported
    }

    #[instrument(skip(self, options, filter))]
    fn start(&mut self, options: &CaptureOptions, filter: &CategoryFilter) -> Result<()> {
        if self.running {
            anyhow::bail!("Replay capture is already running");
        }
        debug!(
            "Replay capture started (chrome_trace={}, {} included categories)",
            options.enable_chrome_trace,
            filter.included.len()
        );
        self.last_filter = Some(filter.clone());
        self.running = true;
        self.starts += 1;
        Ok(())
    }

    #[instrument(skip(self))]
    fn stop(&mut self) -> Result<RawTrace> {
        if !self.running {
            anyhow::bail!("Replay capture is not running");
        }
        self.running = false;
        self.stops += 1;
        debug!("Replay capture stopped");
        Ok(self.trace.clone())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
