//! Adapters from pipeline output to what the chart and table render.

use std::collections::HashSet;

use serde::Serialize;

use rollcall_core::{DashboardRow, FilterSpecification, Metric, WorkshopRecord};

/// Raw counts kept alongside plotted values for labels and tooltips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawCounts {
    pub attendance: u64,
    pub seats_taken: u64,
    pub seats: u64,
}

impl From<&DashboardRow> for RawCounts {
    fn from(row: &DashboardRow) -> Self {
        Self {
            attendance: row.attendance(),
            seats_taken: row.seats_taken(),
            seats: row.seats(),
        }
    }
}

/// Tooltip and bar-label text for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCaption {
    pub title: String,
    pub footer: String,
    /// `attendance / registrations / capacity`, drawn above the bar.
    pub label: String,
}

impl RowCaption {
    pub fn for_row(row: &DashboardRow, spec: &FilterSpecification) -> Self {
        let raw = RawCounts::from(row);

        let title = match spec.metric {
            Metric::Percentage => {
                let percent = if raw.seats == 0 {
                    0.0
                } else {
                    100.0 * raw.attendance as f64 / raw.seats as f64
                };
                format!("{} ({:.2}%)", row.title(), percent)
            }
            Metric::Count => format!(
                "{} ({}/{}) ({} Registrations)",
                row.title(),
                raw.attendance,
                raw.seats,
                raw.seats_taken
            ),
        };

        let footer = match (spec.categorize, row.start(), row.end()) {
            (false, Some(start), Some(end)) => format!(
                "Start: {}\nEnd: {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ),
            _ => format!("Total: {}/{}", raw.attendance, raw.seats),
        };

        Self {
            title,
            footer,
            label: format!("{} / {} / {}", raw.attendance, raw.seats_taken, raw.seats),
        }
    }
}

/// Labeled three-series dataset for one chart slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub labels: Vec<String>,
    pub attendance: Vec<f64>,
    pub registrations: Vec<f64>,
    pub capacity: Vec<f64>,
    pub raw: Vec<RawCounts>,
    pub captions: Vec<RowCaption>,
    pub metric: Metric,
    pub categorize: bool,
}

impl ChartDataset {
    /// Build from the rows [`crate::apply`] produced for `spec`.
    ///
    /// Plotted values are the display metrics when present, raw counts otherwise.
    pub fn from_rows(rows: &[DashboardRow], spec: &FilterSpecification) -> Self {
        let mut dataset = Self {
            labels: Vec::with_capacity(rows.len()),
            attendance: Vec::with_capacity(rows.len()),
            registrations: Vec::with_capacity(rows.len()),
            capacity: Vec::with_capacity(rows.len()),
            raw: Vec::with_capacity(rows.len()),
            captions: Vec::with_capacity(rows.len()),
            metric: spec.metric,
            categorize: spec.categorize,
        };

        for row in rows {
            let (attendance, registrations, capacity) = row.plotted();
            dataset.labels.push(row.title().to_string());
            dataset.attendance.push(attendance);
            dataset.registrations.push(registrations);
            dataset.capacity.push(capacity);
            dataset.raw.push(RawCounts::from(row));
            dataset.captions.push(RowCaption::for_row(row, spec));
        }

        dataset
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Totals shown under the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub workshops: usize,
    pub attendance: u64,
    pub registrations: u64,
    pub capacity: u64,
    /// Attendance as a percentage of registrations; `None` with no registrations.
    pub attendance_rate: Option<f64>,
}

impl SummaryStats {
    pub fn from_rows(rows: &[DashboardRow]) -> Self {
        let attendance = total(rows, DashboardRow::attendance);
        let registrations = total(rows, DashboardRow::seats_taken);
        let capacity = total(rows, DashboardRow::seats);

        Self {
            workshops: rows.len(),
            attendance,
            registrations,
            capacity,
            attendance_rate: (registrations > 0)
                .then(|| attendance as f64 / registrations as f64 * 100.0),
        }
    }
}

fn total(rows: &[DashboardRow], count: fn(&DashboardRow) -> u64) -> u64 {
    rows.iter().map(count).fold(0, u64::saturating_add)
}

/// Row visibility for the detail table.
///
/// The table is built once from every record; a filter change only toggles
/// which ids are shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    /// Ids to show, in table order.
    pub visible: Vec<i64>,
    /// Ids to hide, in table order.
    pub hidden: Vec<i64>,
    pub stats: SummaryStats,
}

impl TableView {
    /// `all` is the full record set in table order, `rows` the
    /// [`crate::filter_for_table`] output.
    pub fn build(all: &[WorkshopRecord], rows: &[DashboardRow]) -> Self {
        let shown: HashSet<i64> = rows.iter().filter_map(|r| r.id()).collect();
        let (visible, hidden): (Vec<i64>, Vec<i64>) = all
            .iter()
            .map(|r| r.id)
            .partition(|id| shown.contains(id));

        Self {
            visible,
            hidden,
            stats: SummaryStats::from_rows(rows),
        }
    }
}
