//! Percent-of-capacity conversion.

use rollcall_core::defaults::PERCENT_CAPACITY;
use rollcall_core::{DashboardRow, DisplayMetrics};

/// Percentages of capacity for one row's counts.
///
/// A zero-capacity row reports 0% rather than an undefined ratio.
pub fn display_metrics(attendance: u64, seats_taken: u64, seats: u64) -> DisplayMetrics {
    let percent = |value: u64| {
        if seats == 0 {
            0.0
        } else {
            value as f64 / seats as f64 * PERCENT_CAPACITY
        }
    };
    DisplayMetrics {
        attendance: percent(attendance),
        seats_taken: percent(seats_taken),
        seats: PERCENT_CAPACITY,
    }
}

/// Attach display metrics to every row; raw counts are retained.
pub fn to_percentages(rows: Vec<DashboardRow>) -> Vec<DashboardRow> {
    rows.into_iter()
        .map(|row| {
            let metrics = display_metrics(row.attendance(), row.seats_taken(), row.seats());
            row.with_display(metrics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::AggregatedRow;

    #[test]
    fn test_display_metrics() {
        let m = display_metrics(10, 15, 20);
        assert!((m.attendance - 50.0).abs() < 1e-9);
        assert!((m.seats_taken - 75.0).abs() < 1e-9);
        assert_eq!(m.seats, 100.0);
    }

    #[test]
    fn test_display_metrics_over_capacity() {
        let m = display_metrics(30, 45, 20);
        assert!((m.attendance - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_metrics_zero_capacity() {
        let m = display_metrics(3, 4, 0);
        assert_eq!(m.attendance, 0.0);
        assert_eq!(m.seats_taken, 0.0);
        assert_eq!(m.seats, 100.0);
    }

    #[test]
    fn test_to_percentages_keeps_raw_counts() {
        let rows = vec![DashboardRow::aggregate(AggregatedRow {
            title: "git".to_string(),
            attendance: 1,
            seats_taken: 2,
            seats: 4,
            contributing: 1,
        })];
        let out = to_percentages(rows);
        assert_eq!(out[0].attendance(), 1);
        let display = out[0].display.unwrap();
        assert!((display.attendance - 25.0).abs() < 1e-9);
        assert!((display.seats_taken - 50.0).abs() < 1e-9);
    }
}
