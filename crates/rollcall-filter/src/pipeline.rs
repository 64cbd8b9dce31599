//! The fixed-order filter pipeline.
//!
//! Stage order is part of the contract and cannot be rearranged:
//!
//! 1. drop unattended (when `drop`)
//! 2. name, 3. time, 4. tags, 5. date (each only when its expression is set)
//! 6. categorize (when `categorize`)
//! 7. percentage metrics (when `metric == percentage`)
//! 8. stable sort by start
//!
//! Records are only ever borrowed; every stage yields a new sequence.

use std::time::Instant;

use tracing::debug;

use rollcall_core::{DashboardRow, FilterSpecification, Metric, WorkshopRecord};

use crate::categorize::categorize;
use crate::metric::to_percentages;
use crate::predicates::{apply_dimension, drop_unattended};

/// Run the selection stages (1-5) and return the surviving records.
///
/// OR unions are not deduplicated, so a record can appear more than once.
pub fn select<'a>(
    records: &'a [WorkshopRecord],
    spec: &FilterSpecification,
) -> Vec<&'a WorkshopRecord> {
    let mut rows: Vec<&WorkshopRecord> = records.iter().collect();

    if spec.drop {
        rows = drop_unattended(&rows);
    }

    for dimension in spec.active_dimensions() {
        if let Some(expression) = spec.expression(dimension) {
            rows = apply_dimension(&rows, dimension, expression);
        }
    }

    rows
}

/// Run the whole pipeline for a chart.
pub fn apply(records: &[WorkshopRecord], spec: &FilterSpecification) -> Vec<DashboardRow> {
    let started = Instant::now();
    let selected = select(records, spec);

    let mut rows = if spec.categorize {
        categorize(&selected)
    } else {
        selected
            .into_iter()
            .map(|record| DashboardRow::workshop(record.clone()))
            .collect()
    };

    if spec.metric == Metric::Percentage {
        rows = to_percentages(rows);
    }

    let rows = sort_chronologically(rows);

    debug!(
        record_count = records.len(),
        result_count = rows.len(),
        categorize = spec.categorize,
        metric = %spec.metric,
        duration_ms = started.elapsed().as_millis() as u64,
        "Filter pipeline complete"
    );

    rows
}

/// Pipeline variant for the detail table: identical except categorize is off.
pub fn filter_for_table(records: &[WorkshopRecord], spec: &FilterSpecification) -> Vec<DashboardRow> {
    apply(records, &spec.for_table())
}

/// Stable ascending sort by start; rows without a start sort as epoch zero.
pub fn sort_chronologically(mut rows: Vec<DashboardRow>) -> Vec<DashboardRow> {
    rows.sort_by_key(|row| row.start().map(|s| s.timestamp_millis()).unwrap_or(0));
    rows
}
