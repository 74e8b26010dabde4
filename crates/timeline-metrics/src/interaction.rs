//! Interaction records emitted by the page under test
//!
//! A page marks the span of work it wants measured by emitting an async
//! trace event whose name follows a fixed convention:
//!
//! ```text
//! Interaction.<label>
//! Interaction.<label>/<flag>[,<flag>...]
//! ```
//!
//! The `repeatable` flag allows the label to occur more than once in a
//! trace. Every other flag is a user flag (`is-fast`, `is-smooth`,
//! `is-responsive`, ...) used to pick which metrics run over the record.
//!
//! # Example
//!
//! ```
//! use timeline_metrics::interaction::{is_interaction_marker, InteractionRecord};
//! use timeline_metrics::trace_model::{AsyncEvent, ContextId};
//!
//! let event = AsyncEvent::new("Interaction.scroll/is-smooth,repeatable", 10.0, 250.0);
//! assert!(is_interaction_marker(&event.name));
//!
//! let record = InteractionRecord::from_async_event(ContextId::new(1, 1), &event)?;
//! assert_eq!(record.label, "scroll");
//! assert!(record.repeatable);
//! assert!(record.has_flag("is-smooth"));
//! # Ok::<(), timeline_metrics::MeasurementError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{MeasurementError, Result};
use crate::trace_model::{AsyncEvent, ContextId, TimeRange};

/// Name prefix that marks an async event as an interaction record
pub const INTERACTION_PREFIX: &str = "Interaction.";

/// Flag that lets a label occur more than once per trace
pub const REPEATABLE: &str = "repeatable";

/// User flags understood by the default metrics resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserFlag {
    #[serde(rename = "is-fast")]
    IsFast,
    #[serde(rename = "is-smooth")]
    IsSmooth,
    #[serde(rename = "is-responsive")]
    IsResponsive,
}

impl UserFlag {
    pub const ALL: [UserFlag; 3] = [UserFlag::IsFast, UserFlag::IsSmooth, UserFlag::IsResponsive];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserFlag::IsFast => "is-fast",
            UserFlag::IsSmooth => "is-smooth",
            UserFlag::IsResponsive => "is-responsive",
        }
    }

    pub fn parse(flag: &str) -> Option<Self> {
        UserFlag::ALL.into_iter().find(|f| f.as_str() == flag)
    }
}

impl fmt::Display for UserFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name a metric value is reported under for an interaction label
pub fn result_name(label: &str, metric_name: &str) -> String {
    format!("{}-{}", label, metric_name)
}

/// Whether an async event name follows the interaction record convention
pub fn is_interaction_marker(event_name: &str) -> bool {
    event_name.starts_with(INTERACTION_PREFIX)
}

/// One parsed interaction marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Logical name shared by every occurrence of the same interaction
    pub label: String,
    pub repeatable: bool,
    pub user_flags: BTreeSet<String>,
    pub time_range: TimeRange,
}

impl InteractionRecord {
    pub fn new(label: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            label: label.into(),
            repeatable: false,
            user_flags: BTreeSet::new(),
            time_range,
        }
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.user_flags.insert(flag.into());
        self
    }

    /// Parse a record from an async event recorded on `context`
    ///
    /// # Errors
    ///
    /// Returns [`MeasurementError::MalformedInteractionRecord`] if:
    /// - The name does not carry the interaction prefix
    /// - The label or a flag token is empty
    /// - The event ends before it starts
    /// - The event ends on a different execution context
    pub fn from_async_event(context: ContextId, event: &AsyncEvent) -> Result<Self> {
        let name = event.name.as_str();
        let body = name
            .strip_prefix(INTERACTION_PREFIX)
            .ok_or_else(|| MeasurementError::malformed(name, "not an interaction record"))?;

        // The flag list is whatever follows the last '/'; labels may contain '/'.
        let (label, flags) = match body.rsplit_once('/') {
            Some((label, flags)) => (label, Some(flags)),
            None => (body, None),
        };

        if label.is_empty() {
            return Err(MeasurementError::malformed(name, "empty label"));
        }

        let mut repeatable = false;
        let mut user_flags = BTreeSet::new();
        if let Some(flags) = flags {
            for flag in flags.split(',') {
                if flag.is_empty() {
                    return Err(MeasurementError::malformed(name, "empty flag"));
                }
                if flag == REPEATABLE {
                    repeatable = true;
                } else {
                    user_flags.insert(flag.to_string());
                }
            }
        }

        if event.end < event.start {
            return Err(MeasurementError::malformed(
                name,
                format!("ends at {} before it starts at {}", event.end, event.start),
            ));
        }

        if let Some(end_context) = event.end_context {
            if end_context != context {
                return Err(MeasurementError::malformed(
                    name,
                    format!("starts on context {} but ends on {}", context, end_context),
                ));
            }
        }

        Ok(Self {
            label: label.to_string(),
            repeatable,
            user_flags,
            time_range: event.range(),
        })
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.user_flags.contains(flag)
    }

    pub fn duration(&self) -> f64 {
        self.time_range.duration()
    }

    pub fn overlaps(&self, range: &TimeRange) -> bool {
        self.time_range.overlaps(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ContextId {
        ContextId::new(1, 1)
    }

    fn parse(name: &str) -> Result<InteractionRecord> {
        InteractionRecord::from_async_event(ctx(), &AsyncEvent::new(name, 0.0, 10.0))
    }

    #[test]
    fn test_marker_predicate() {
        assert!(is_interaction_marker("Interaction.scroll"));
        assert!(is_interaction_marker("Interaction.tap/is-fast"));
        assert!(!is_interaction_marker("interaction.scroll"));
        assert!(!is_interaction_marker("InputLatency::Tap"));
        assert!(!is_interaction_marker("Interaction"));
    }

    #[test]
    fn test_parse_label_without_flags() {
        let record = parse("Interaction.scroll").unwrap();
        assert_eq!(record.label, "scroll");
        assert!(!record.repeatable);
        assert!(record.user_flags.is_empty());
        assert_eq!(record.time_range, TimeRange::new(0.0, 10.0));
    }

    #[test]
    fn test_parse_flags_and_repeatable() {
        let record = parse("Interaction.tap/is-fast,repeatable,is-responsive").unwrap();
        assert_eq!(record.label, "tap");
        assert!(record.repeatable);
        assert_eq!(
            record.user_flags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["is-fast", "is-responsive"]
        );
    }

    #[test]
    fn test_unknown_flags_are_kept_for_the_resolver() {
        let record = parse("Interaction.tap/is-wobbly").unwrap();
        assert!(record.has_flag("is-wobbly"));
    }

    #[test]
    fn test_label_may_contain_slash() {
        let record = parse("Interaction.menu/open/is-fast").unwrap();
        assert_eq!(record.label, "menu/open");
        assert!(record.has_flag("is-fast"));
    }

    #[test]
    fn test_malformed_markers() {
        for name in [
            "Interaction.",
            "Interaction./is-fast",
            "Interaction.tap/",
            "Interaction.tap/is-fast,,repeatable",
            "Other.tap",
        ] {
            let err = parse(name).unwrap_err();
            assert!(
                matches!(err, MeasurementError::MalformedInteractionRecord { .. }),
                "{} should be malformed",
                name
            );
        }
    }

    #[test]
    fn test_inverted_range_is_malformed() {
        let event = AsyncEvent::new("Interaction.tap", 10.0, 5.0);
        let err = InteractionRecord::from_async_event(ctx(), &event).unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn test_cross_context_event_is_malformed() {
        let mut event = AsyncEvent::new("Interaction.tap", 0.0, 5.0);
        event.end_context = Some(ContextId::new(1, 2));
        assert!(InteractionRecord::from_async_event(ctx(), &event).is_err());

        event.end_context = Some(ctx());
        assert!(InteractionRecord::from_async_event(ctx(), &event).is_ok());
    }

    #[test]
    fn test_result_name_prefixes_label() {
        assert_eq!(result_name("scroll", "frame_times"), "scroll-frame_times");
        assert_eq!(result_name("menu/open", "fast-duration"), "menu/open-fast-duration");
    }

    #[test]
    fn test_user_flag_parse() {
        for flag in UserFlag::ALL {
            assert_eq!(UserFlag::parse(flag.as_str()), Some(flag));
        }
        assert_eq!(UserFlag::parse("is_fast"), None);
        assert_eq!(UserFlag::parse(REPEATABLE), None);
    }
}
