//! Group-by-tag aggregation.

use std::collections::BTreeMap;

use rollcall_core::{AggregatedRow, DashboardRow, WorkshopRecord};

/// Replace workshop rows with one summed row per distinct tag.
///
/// A record with N tags contributes to N rows; a record present twice in
/// `records` (from an OR union) contributes twice. Rows come out in ascending
/// tag order.
pub fn categorize(records: &[&WorkshopRecord]) -> Vec<DashboardRow> {
    let mut by_tag: BTreeMap<&str, AggregatedRow> = BTreeMap::new();

    for record in records {
        for tag in &record.tags {
            let row = by_tag.entry(tag.as_str()).or_insert_with(|| AggregatedRow {
                title: tag.clone(),
                attendance: 0,
                seats_taken: 0,
                seats: 0,
                contributing: 0,
            });
            row.attendance = row.attendance.saturating_add(record.attendance);
            row.seats_taken = row.seats_taken.saturating_add(record.seats_taken);
            row.seats = row.seats.saturating_add(record.seats);
            row.contributing += 1;
        }
    }

    by_tag.into_values().map(DashboardRow::aggregate).collect()
}
