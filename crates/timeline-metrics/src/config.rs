//! Measurement options and their TOML configuration
//!
//! [`MetricsOptions`] is what the coordinator runs with: the overhead
//! setting, extra trace categories, and the flags → metrics resolver. It can
//! be built in code or loaded from a TOML file:
//!
//! ```toml
//! [measurement]
//! overhead_level = "minimal-overhead"
//! extra_category_filters = ["netlog", "v8"]
//! ```
//!
//! or, with a custom category filter instead of a predefined level:
//!
//! ```toml
//! [measurement]
//! extra_category_filters = ["v8"]
//!
//! [measurement.custom_filter]
//! included = ["blink", "cc"]
//! excluded = ["*"]
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::category_filter::{CategoryFilter, OverheadLevel, OverheadSetting};
use crate::error::{MeasurementError, Result};
use crate::metrics::{default_flags_resolver, FlagsResolver};

/// Options for one timeline based measurement
///
/// Built once before any capture and left untouched while cycles run; the
/// coordinator owns its copy.
#[derive(Clone)]
pub struct MetricsOptions {
    overhead_level: OverheadSetting,
    extra_category_filters: Vec<String>,
    flags_resolver: FlagsResolver,
}

impl MetricsOptions {
    pub fn new(overhead_level: impl Into<OverheadSetting>) -> Self {
        Self {
            overhead_level: overhead_level.into(),
            extra_category_filters: Vec::new(),
            flags_resolver: default_flags_resolver(),
        }
    }

    /// Options for a named overhead level
    ///
    /// # Errors
    ///
    /// Returns [`MeasurementError::Configuration`] if `level` is not one of
    /// the predefined overhead levels.
    ///
    /// # Example
    ///
    /// ```
    /// use timeline_metrics::config::MetricsOptions;
    ///
    /// assert!(MetricsOptions::from_level("debug-overhead").is_ok());
    /// assert!(MetricsOptions::from_level("bogus-level").is_err());
    /// ```
    pub fn from_level(level: &str) -> Result<Self> {
        Ok(Self::new(level.parse::<OverheadLevel>()?))
    }

    /// Replace the flags → metrics resolver
    pub fn with_flags_resolver(mut self, resolver: FlagsResolver) -> Self {
        self.flags_resolver = resolver;
        self
    }

    /// Append categories to include on top of the overhead level's filter
    pub fn extend_trace_category_filters<I, S>(&mut self, filters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_category_filters
            .extend(filters.into_iter().map(Into::into));
    }

    pub fn overhead_level(&self) -> &OverheadSetting {
        &self.overhead_level
    }

    pub fn extra_category_filters(&self) -> &[String] {
        &self.extra_category_filters
    }

    pub fn flags_resolver(&self) -> &FlagsResolver {
        &self.flags_resolver
    }
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self::new(OverheadSetting::default())
    }
}

impl fmt::Debug for MetricsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsOptions")
            .field("overhead_level", &self.overhead_level)
            .field("extra_category_filters", &self.extra_category_filters)
            .finish_non_exhaustive()
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub measurement: MeasurementConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed.
    /// An unknown overhead level is only reported by
    /// [`Config::metrics_options`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    pub fn metrics_options(&self) -> Result<MetricsOptions> {
        MetricsOptions::try_from(&self.measurement)
    }
}

/// The `[measurement]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// One of the predefined overhead level names
    #[serde(default)]
    pub overhead_level: Option<String>,
    /// Filter to use instead of a predefined level
    #[serde(default)]
    pub custom_filter: Option<CategoryFilter>,
    #[serde(default)]
    pub extra_category_filters: Vec<String>,
}

impl TryFrom<&MeasurementConfig> for MetricsOptions {
    type Error = MeasurementError;

    fn try_from(config: &MeasurementConfig) -> Result<Self> {
        let setting = match (&config.overhead_level, &config.custom_filter) {
            (Some(_), Some(_)) => {
                return Err(MeasurementError::Configuration(
                    "Set either overhead_level or custom_filter, not both".to_string(),
                ))
            }
            (Some(level), None) => OverheadSetting::Level(level.parse()?),
            (None, Some(filter)) => OverheadSetting::Custom(filter.clone()),
            (None, None) => OverheadSetting::default(),
        };

        let mut options = MetricsOptions::new(setting);
        options.extend_trace_category_filters(config.extra_category_filters.iter().cloned());
        Ok(options)
    }
}
