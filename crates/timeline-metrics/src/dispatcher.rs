//! Interaction record extraction and metric dispatch
//!
//! Extraction walks the trace model's execution contexts in order and
//! collects the interaction records each one emitted. Dispatch then groups
//! every context's records by label, checks the group is consistent, and
//! runs the metrics its flags select.
//!
//! # Invariants
//!
//! - A label belongs to one execution context. Seeing a label on a context
//!   when an earlier context already emitted it is an error.
//! - A label occurring more than once on its context must be `repeatable`
//!   on every occurrence.
//! - Every occurrence of a label carries the same user flags.
//!
//! A label group is fully validated and its metrics resolved before any of
//! its metrics run. There is no rollback across labels: if a later group
//! fails, values already reported for earlier groups stay in the sink.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, instrument};

use crate::error::{MeasurementError, Result};
use crate::interaction::{is_interaction_marker, InteractionRecord};
use crate::metrics::FlagsResolver;
use crate::results::{LabeledResults, ResultsSink};
use crate::trace_model::{ExecutionContext, TraceModel};

/// Interaction records emitted on one execution context, in trace order
#[derive(Debug, Clone, PartialEq)]
pub struct ContextRecords<'a> {
    pub context: &'a ExecutionContext,
    pub records: Vec<InteractionRecord>,
}

/// Collect interaction records per execution context
///
/// Contexts are visited in model order and contexts without records are
/// left out.
///
/// # Errors
///
/// - [`MeasurementError::MalformedInteractionRecord`] for a marker that
///   cannot be parsed; extraction stops there.
/// - [`MeasurementError::InvalidInteractions`] when a label already seen on
///   an earlier context shows up on a later one.
#[instrument(skip(model), fields(contexts = model.contexts.len()))]
pub fn extract_by_context(model: &TraceModel) -> Result<Vec<ContextRecords<'_>>> {
    let mut groups = Vec::new();
    let mut labels_of_previous_contexts: HashSet<String> = HashSet::new();

    for context in &model.contexts {
        let mut records = Vec::new();
        for event in &context.async_events {
            if !is_interaction_marker(&event.name) {
                continue;
            }
            let record = InteractionRecord::from_async_event(context.id, event)?;
            if labels_of_previous_contexts.contains(&record.label) {
                return Err(MeasurementError::InvalidInteractions(format!(
                    "Interaction record label {} is duplicated on different contexts (seen again on {})",
                    record.label, context.id
                )));
            }
            records.push(record);
        }

        if !records.is_empty() {
            debug!(
                "Context {} emitted {} interaction records",
                context.id,
                records.len()
            );
            labels_of_previous_contexts.extend(records.iter().map(|r| r.label.clone()));
            groups.push(ContextRecords { context, records });
        }
    }

    Ok(groups)
}

/// Run the metrics selected by each label group's flags
///
/// Every metric reports through a [`LabeledResults`] for its label.
#[instrument(skip_all, fields(contexts = groups.len()))]
pub fn dispatch(
    model: &TraceModel,
    groups: &[ContextRecords<'_>],
    resolver: &FlagsResolver,
    results: &mut dyn ResultsSink,
) -> Result<()> {
    for group in groups {
        for (label, interactions) in group_by_label(&group.records) {
            add_results_for_label(model, group.context, &label, &interactions, resolver, results)?;
        }
    }
    Ok(())
}

fn group_by_label(records: &[InteractionRecord]) -> BTreeMap<String, Vec<InteractionRecord>> {
    let mut by_label: BTreeMap<String, Vec<InteractionRecord>> = BTreeMap::new();
    for record in records {
        by_label
            .entry(record.label.clone())
            .or_default()
            .push(record.clone());
    }
    by_label
}

/// Check a label group and return its (uniform) user flags
fn validate_label_group(interactions: &[InteractionRecord]) -> Result<&BTreeSet<String>> {
    let first = interactions.first().ok_or_else(|| {
        MeasurementError::InvalidInteractions("Empty interaction record group".to_string())
    })?;

    if interactions.len() > 1 && !interactions.iter().all(|i| i.repeatable) {
        return Err(MeasurementError::InvalidInteractions(format!(
            "Unrepeatable interaction {} recorded more than once",
            first.label
        )));
    }

    if interactions[1..]
        .iter()
        .any(|i| i.user_flags != first.user_flags)
    {
        return Err(MeasurementError::InvalidInteractions(format!(
            "Interaction records labelled {} must all have the same flags",
            first.label
        )));
    }

    Ok(&first.user_flags)
}

fn add_results_for_label(
    model: &TraceModel,
    context: &ExecutionContext,
    label: &str,
    interactions: &[InteractionRecord],
    resolver: &FlagsResolver,
    results: &mut dyn ResultsSink,
) -> Result<()> {
    if interactions.is_empty() {
        return Ok(());
    }

    let flags = validate_label_group(interactions)?;
    let metrics = resolver(flags)?;
    debug!(
        "Running {} metrics for {} x {} on context {}",
        metrics.len(),
        interactions.len(),
        label,
        context.id
    );

    let mut labeled = LabeledResults::new(results, label);
    for metric in &metrics {
        metric
            .add_results(model, context, interactions, &mut labeled)
            .map_err(|error| MeasurementError::Metric {
                metric: metric.name().to_string(),
                error,
            })?;
    }
    Ok(())
}
