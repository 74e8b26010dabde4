//! Page test adapter
//!
//! Navigation drivers run a page through three hooks: before navigating,
//! after the page's interactions have run, and on cleanup.
//! [`TimelineBasedPageTest`] maps those hooks onto the measurement's
//! lifecycle, taking the synthetic delays from the page.

use tracing::instrument;

use crate::capture::TraceCapture;
use crate::error::Result;
use crate::measurement::TimelineBasedMeasurement;
use crate::results::ResultsSink;
use crate::trace_model::TraceModelBuilder;

/// Page action that runs the story's interactions
pub const RUN_PAGE_INTERACTIONS: &str = "RunPageInteractions";

/// A page being run by the navigation driver
pub trait UserStory {
    fn name(&self) -> &str;

    /// Synthetic delays to inject while this page is traced
    fn synthetic_delay_categories(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Browser tab exposing its platform's trace capture service
pub trait Tab {
    fn tracing_controller(&mut self) -> &mut dyn TraceCapture;
}

impl<T: TraceCapture> Tab for T {
    fn tracing_controller(&mut self) -> &mut dyn TraceCapture {
        self
    }
}

/// Hooks a navigation driver calls around each page
pub trait PageTest {
    /// Name of the page action the driver should run between the hooks
    fn action_name_to_run(&self) -> &str;

    fn will_navigate_to_page(&mut self, page: &dyn UserStory, tab: &mut dyn Tab) -> Result<()>;

    fn validate_and_measure_page(
        &mut self,
        page: &dyn UserStory,
        tab: &mut dyn Tab,
        results: &mut dyn ResultsSink,
    ) -> Result<()>;

    /// Always called, even when an earlier hook failed
    fn clean_up_after_page(&mut self, page: &dyn UserStory, tab: &mut dyn Tab);
}

/// Page test that collects metrics with a [`TimelineBasedMeasurement`]
pub struct TimelineBasedPageTest<B> {
    measurement: TimelineBasedMeasurement<B>,
}

impl<B: TraceModelBuilder> TimelineBasedPageTest<B> {
    pub fn new(measurement: TimelineBasedMeasurement<B>) -> Self {
        Self { measurement }
    }
}

impl<B: TraceModelBuilder> PageTest for TimelineBasedPageTest<B> {
    fn action_name_to_run(&self) -> &str {
        RUN_PAGE_INTERACTIONS
    }

    fn will_navigate_to_page(&mut self, page: &dyn UserStory, tab: &mut dyn Tab) -> Result<()> {
        let delays = page.synthetic_delay_categories();
        self.measurement
            .will_run_user_story(tab.tracing_controller(), &delays)
    }

    fn validate_and_measure_page(
        &mut self,
        _page: &dyn UserStory,
        tab: &mut dyn Tab,
        results: &mut dyn ResultsSink,
    ) -> Result<()> {
        self.measurement.measure(tab.tracing_controller(), results)
    }

    fn clean_up_after_page(&mut self, _page: &dyn UserStory, tab: &mut dyn Tab) {
        self.measurement.did_run_user_story(tab.tracing_controller());
    }
}

/// Drive one page through a page test
///
/// The page's own interactions are run by the navigation driver between the
/// two hooks; this only guarantees the cleanup hook runs on every path.
#[instrument(skip_all, fields(page = %page.name()))]
pub fn run_page(
    test: &mut dyn PageTest,
    page: &dyn UserStory,
    tab: &mut dyn Tab,
    results: &mut dyn ResultsSink,
) -> Result<()> {
    let outcome = match test.will_navigate_to_page(page, tab) {
        Ok(()) => test.validate_and_measure_page(page, tab, results),
        Err(e) => Err(e),
    };
    test.clean_up_after_page(page, tab);
    outcome
}

/// A page described by name and synthetic delays
#[derive(Debug, Clone, Default)]
pub struct StoryPage {
    pub name: String,
    pub synthetic_delays: Vec<String>,
}

impl StoryPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            synthetic_delays: Vec::new(),
        }
    }

    pub fn with_synthetic_delay(mut self, delay: impl Into<String>) -> Self {
        self.synthetic_delays.push(delay.into());
        self
    }
}

impl UserStory for StoryPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn synthetic_delay_categories(&self) -> Vec<String> {
        self.synthetic_delays.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{RawTrace, ReplayCapture};
    use crate::config::MetricsOptions;
    use crate::error::MeasurementError;
    use crate::results::PageResults;
    use serde_json::json;

    fn page_test() -> TimelineBasedPageTest<crate::trace_model::JsonModelBuilder> {
        TimelineBasedPageTest::new(TimelineBasedMeasurement::new(MetricsOptions::default()))
    }

    #[test]
    fn test_page_delays_reach_capture_filter() {
        let page = StoryPage::new("scroll_page")
            .with_synthetic_delay("DELAY(cc.BeginMainFrame;0.014;alternating)");
        let mut tab = ReplayCapture::new(RawTrace::new(json!({ "contexts": [] })));
        let mut test = page_test();

        test.will_navigate_to_page(&page, &mut tab).unwrap();

        assert_eq!(
            tab.last_filter().unwrap().synthetic_delays,
            vec!["DELAY(cc.BeginMainFrame;0.014;alternating)"]
        );
        assert_eq!(test.action_name_to_run(), "RunPageInteractions");
    }

    #[test]
    fn test_run_page_measures_and_cleans_up() {
        let page = StoryPage::new("tap_page");
        let mut tab = ReplayCapture::new(RawTrace::new(json!({
            "contexts": [{
                "id": { "pid": 1, "tid": 1 },
                "async_events": [{ "name": "Interaction.tap/is-fast", "start": 0.0, "end": 5.0 }]
            }]
        })));
        let mut test = page_test();
        let mut results = PageResults::for_page(page.name());

        run_page(&mut test, &page, &mut tab, &mut results).unwrap();

        assert!(results.value_named("tap-fast-duration").is_some());
        assert!(!tab.is_running());
    }

    #[test]
    fn test_run_page_cleans_up_when_measure_fails() {
        let page = StoryPage::new("bad_page");
        let mut tab = ReplayCapture::new(RawTrace::new(json!({
            "contexts": [{
                "id": { "pid": 1, "tid": 1 },
                "async_events": [{ "name": "Interaction.tap/is-wobbly", "start": 0.0, "end": 5.0 }]
            }]
        })));
        let mut test = page_test();
        let mut results = PageResults::new();

        let err = run_page(&mut test, &page, &mut tab, &mut results).unwrap_err();

        assert!(matches!(err, MeasurementError::UnknownFlags { .. }));
        assert!(!tab.is_running());
        assert!(results.is_empty());
    }
}
