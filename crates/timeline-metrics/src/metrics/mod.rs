//! Timeline metrics and the flags → metrics resolver
//!
//! Which metrics run over an interaction is decided by the page, through the
//! user flags on its interaction records. A [`FlagsResolver`] maps a flag
//! set to metric instances; [`default_flags_resolver`] covers the three
//! built-in flags:
//!
//! | flag            | metric                   |
//! |-----------------|--------------------------|
//! | `is-fast`       | [`FastMetric`]           |
//! | `is-smooth`     | [`SmoothnessMetric`]     |
//! | `is-responsive` | [`ResponsivenessMetric`] |
//!
//! Benchmarks with their own metrics pass a different resolver through
//! [`MetricsOptions`](crate::config::MetricsOptions).

pub mod fast;
pub mod responsiveness;
pub mod smoothness;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{MeasurementError, Result};
use crate::interaction::{InteractionRecord, UserFlag};
use crate::results::ResultsSink;
use crate::trace_model::{ExecutionContext, TraceModel};

pub use fast::FastMetric;
pub use responsiveness::ResponsivenessMetric;
pub use smoothness::SmoothnessMetric;

/// A metric computed over one label's interaction records
pub trait TimelineMetric: fmt::Debug {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Report values for `interactions`, all recorded on `context`
    ///
    /// `results` is already scoped to the interaction label, so values are
    /// reported under their plain metric names.
    fn add_results(
        &self,
        model: &TraceModel,
        context: &ExecutionContext,
        interactions: &[InteractionRecord],
        results: &mut dyn ResultsSink,
    ) -> anyhow::Result<()>;
}

/// Maps a label's (uniform) user flags to the metrics to run
pub type FlagsResolver =
    Arc<dyn Fn(&BTreeSet<String>) -> Result<Vec<Box<dyn TimelineMetric>>> + Send + Sync>;

/// Resolver used when the options do not supply one
pub fn default_flags_resolver() -> FlagsResolver {
    Arc::new(metrics_from_flags)
}

/// Built-in flags → metrics table
///
/// # Errors
///
/// Returns [`MeasurementError::UnknownFlags`] listing every flag not in the
/// table, sorted.
pub fn metrics_from_flags(flags: &BTreeSet<String>) -> Result<Vec<Box<dyn TimelineMetric>>> {
    let unknown: Vec<String> = flags
        .iter()
        .filter(|f| UserFlag::parse(f).is_none())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(MeasurementError::UnknownFlags { flags: unknown });
    }

    Ok(UserFlag::ALL
        .into_iter()
        .filter(|flag| flags.contains(flag.as_str()))
        .map(metric_for_flag)
        .collect())
}

fn metric_for_flag(flag: UserFlag) -> Box<dyn TimelineMetric> {
    match flag {
        UserFlag::IsFast => Box::new(FastMetric),
        UserFlag::IsSmooth => Box::new(SmoothnessMetric),
        UserFlag::IsResponsive => Box::new(ResponsivenessMetric),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn names(metrics: &[Box<dyn TimelineMetric>]) -> Vec<String> {
        metrics.iter().map(|m| m.name().to_string()).collect()
    }

    #[test]
    fn test_no_flags_no_metrics() {
        assert!(metrics_from_flags(&BTreeSet::new()).unwrap().is_empty());
    }

    #[test]
    fn test_each_flag_maps_to_one_metric() {
        assert_eq!(names(&metrics_from_flags(&flags(&["is-fast"])).unwrap()), vec!["fast"]);
        assert_eq!(
            names(&metrics_from_flags(&flags(&["is-smooth"])).unwrap()),
            vec!["smoothness"]
        );
        assert_eq!(
            names(&metrics_from_flags(&flags(&["is-responsive"])).unwrap()),
            vec!["responsiveness"]
        );
    }

    #[test]
    fn test_all_flags_resolve_in_table_order() {
        let metrics =
            metrics_from_flags(&flags(&["is-responsive", "is-smooth", "is-fast"])).unwrap();
        assert_eq!(names(&metrics), vec!["fast", "smoothness", "responsiveness"]);
    }

    #[test]
    fn test_unknown_flags_listed_sorted() {
        let err = metrics_from_flags(&flags(&["is-fast", "zzz", "aaa"])).unwrap_err();
        match err {
            MeasurementError::UnknownFlags { flags } => {
                assert_eq!(flags, vec!["aaa".to_string(), "zzz".to_string()])
            }
            other => panic!("Expected UnknownFlags, got {:?}", other),
        }
    }

    #[test]
    fn test_default_resolver_matches_table() {
        let resolver = default_flags_resolver();
        let metrics = resolver(&flags(&["is-smooth"])).unwrap();
        assert_eq!(names(&metrics), vec!["smoothness"]);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }
}
