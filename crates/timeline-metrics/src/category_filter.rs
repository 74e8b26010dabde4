//! Overhead levels and trace category filters
//!
//! Every timeline measurement records a single trace, but the more
//! instrumentation is switched on the more the trace perturbs the page under
//! test. The caller picks an [`OverheadLevel`] (or hands over a fully custom
//! [`CategoryFilter`]) and [`resolve_category_filter`] turns it into the
//! concrete filter given to the capture service.
//!
//! # Example
//!
//! ```
//! use timeline_metrics::category_filter::{resolve_category_filter, OverheadLevel, OverheadSetting};
//!
//! let setting = OverheadSetting::Level(OverheadLevel::V8);
//! let filter = resolve_category_filter(
//!     &setting,
//!     &["gpu".to_string()],
//!     &["DELAY(cc.BeginMainFrame;0.014;alternating)".to_string()],
//! );
//! assert!(filter.included.contains(&"v8".to_string()));
//! assert!(filter.included.contains(&"gpu".to_string()));
//! assert_eq!(filter.synthetic_delays.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MeasurementError;

/// Categories recorded even at the lowest overhead level.
const NO_OVERHEAD_CATEGORIES: &[&str] = &[
    "toplevel",
    "benchmark",
    "webkit.console",
    "blink.console",
    "trace_event_overhead",
];

/// Low-cost categories added on top of [`NO_OVERHEAD_CATEGORIES`].
const MINIMAL_OVERHEAD_CATEGORIES: &[&str] = &[
    "blink.user_timing",
    "cc",
    "gpu",
    "renderer.scheduler",
];

const DEBUG_OVERHEAD_CATEGORIES: &[&str] = &[
    "*",
    "disabled-by-default-cc.debug",
    "disabled-by-default-cc.debug.picture",
    "disabled-by-default-cc.debug.quads",
    "disabled-by-default-devtools.timeline",
    "disabled-by-default-gpu.debug",
];

/// A trace category filter handed to the capture service
///
/// The wire format is owned by the capture service; this type only carries
/// the included/excluded category globs and the synthetic delay specs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    /// Category globs to record
    #[serde(default)]
    pub included: Vec<String>,
    /// Category globs to leave out
    #[serde(default)]
    pub excluded: Vec<String>,
    /// Synthetic delay specs, e.g. `DELAY(cc.BeginMainFrame;0.014;alternating)`
    #[serde(default)]
    pub synthetic_delays: Vec<String>,
}

impl CategoryFilter {
    /// Filter that records only the benchmark and console categories
    pub fn no_overhead() -> Self {
        Self {
            included: owned(NO_OVERHEAD_CATEGORIES),
            excluded: vec!["*".to_string()],
            synthetic_delays: Vec::new(),
        }
    }

    /// No-overhead filter plus a handful of cheap rendering categories
    pub fn minimal_overhead() -> Self {
        let mut filter = Self::no_overhead();
        for category in MINIMAL_OVERHEAD_CATEGORIES {
            filter.add_included_category(category);
        }
        filter
    }

    /// Everything, including the disabled-by-default debug categories
    pub fn debug_overhead() -> Self {
        Self {
            included: owned(DEBUG_OVERHEAD_CATEGORIES),
            excluded: Vec::new(),
            synthetic_delays: Vec::new(),
        }
    }

    /// Include a category glob. Adding a glob twice is a no-op.
    pub fn add_included_category(&mut self, category: &str) {
        self.excluded.retain(|c| c != category);
        if !self.included.iter().any(|c| c == category) {
            self.included.push(category.to_string());
        }
    }

    /// Attach a synthetic delay spec verbatim
    pub fn add_synthetic_delay(&mut self, delay: &str) {
        self.synthetic_delays.push(delay.to_string());
    }
}

fn owned(categories: &[&str]) -> Vec<String> {
    categories.iter().map(|c| c.to_string()).collect()
}

/// Predefined instrumentation overhead levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OverheadLevel {
    #[default]
    #[serde(rename = "no-overhead", alias = "none")]
    None,
    /// Temporary level until the relevant v8 events land in `benchmark`
    #[serde(rename = "v8-overhead", alias = "v8")]
    V8,
    #[serde(rename = "minimal-overhead", alias = "minimal")]
    Minimal,
    #[serde(rename = "debug-overhead", alias = "debug")]
    Debug,
}

impl OverheadLevel {
    pub const ALL: [OverheadLevel; 4] = [
        OverheadLevel::None,
        OverheadLevel::V8,
        OverheadLevel::Minimal,
        OverheadLevel::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OverheadLevel::None => "no-overhead",
            OverheadLevel::V8 => "v8-overhead",
            OverheadLevel::Minimal => "minimal-overhead",
            OverheadLevel::Debug => "debug-overhead",
        }
    }

    /// Base filter for this level, before extra categories are applied
    pub fn base_filter(&self) -> CategoryFilter {
        match self {
            OverheadLevel::None => CategoryFilter::no_overhead(),
            OverheadLevel::V8 => {
                let mut filter = CategoryFilter::no_overhead();
                filter.add_included_category("v8");
                filter
            }
            OverheadLevel::Minimal => CategoryFilter::minimal_overhead(),
            OverheadLevel::Debug => CategoryFilter::debug_overhead(),
        }
    }
}

impl fmt::Display for OverheadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverheadLevel {
    type Err = MeasurementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-overhead" | "none" => Ok(OverheadLevel::None),
            "v8-overhead" | "v8" => Ok(OverheadLevel::V8),
            "minimal-overhead" | "minimal" => Ok(OverheadLevel::Minimal),
            "debug-overhead" | "debug" => Ok(OverheadLevel::Debug),
            other => Err(MeasurementError::Configuration(format!(
                "Overhead level must be a custom category filter or one of {}. Given overhead level: {}",
                OverheadLevel::ALL
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                other
            ))),
        }
    }
}

/// Either a predefined overhead level or a caller-supplied filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverheadSetting {
    Level(OverheadLevel),
    Custom(CategoryFilter),
}

impl Default for OverheadSetting {
    fn default() -> Self {
        OverheadSetting::Level(OverheadLevel::default())
    }
}

impl From<OverheadLevel> for OverheadSetting {
    fn from(level: OverheadLevel) -> Self {
        OverheadSetting::Level(level)
    }
}

impl From<CategoryFilter> for OverheadSetting {
    fn from(filter: CategoryFilter) -> Self {
        OverheadSetting::Custom(filter)
    }
}

impl fmt::Display for OverheadSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverheadSetting::Level(level) => level.fmt(f),
            OverheadSetting::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Resolve the filter to start tracing with
///
/// Extra categories are included whatever the base filter is, and synthetic
/// delays are attached as given; their grammar is the capture service's
/// business.
pub fn resolve_category_filter(
    setting: &OverheadSetting,
    extra_categories: &[String],
    synthetic_delays: &[String],
) -> CategoryFilter {
    let mut filter = match setting {
        OverheadSetting::Level(level) => level.base_filter(),
        OverheadSetting::Custom(filter) => filter.clone(),
    };

    for category in extra_categories {
        filter.add_included_category(category);
    }

    for delay in synthetic_delays {
        filter.add_synthetic_delay(delay);
    }

    filter
}
