//! Record and row types flowing through the filter pipeline.
//!
//! [`WorkshopRecord`] is what the record store holds; it is immutable once
//! decoded. Every pipeline stage derives new rows instead of mutating records.
//! The pipeline output is a sequence of [`DashboardRow`], each either a single
//! workshop or a per-tag [`AggregatedRow`], optionally carrying
//! [`DisplayMetrics`] when percentage mode is active.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::timestamp::FlexibleTimestamp;

// =============================================================================
// WORKSHOP RECORD
// =============================================================================

/// One scheduled workshop event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopRecord {
    /// Unique event id.
    pub id: i64,

    pub title: String,

    #[serde(default, deserialize_with = "nullable_text")]
    pub presenter: String,

    #[serde(default, deserialize_with = "nullable_text")]
    pub description: String,

    /// Tags in source order; a record may carry none.
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,

    pub start: FlexibleTimestamp,

    pub end: FlexibleTimestamp,

    /// Capacity.
    #[serde(default, deserialize_with = "count")]
    pub seats: u64,

    /// Registrations.
    #[serde(default, alias = "seatsTaken", deserialize_with = "count")]
    pub seats_taken: u64,

    #[serde(default, deserialize_with = "count")]
    pub attendance: u64,
}

impl WorkshopRecord {
    /// Check record-level invariants (`start <= end`).
    pub fn validate(&self) -> Result<()> {
        if self.start.0 > self.end.0 {
            return Err(Error::InvalidInput(format!(
                "workshop {} starts after it ends ({} > {})",
                self.id, self.start, self.end
            )));
        }
        Ok(())
    }

    /// Exact membership test against the record's tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Accept `null` wherever text is expected (pandas exports missing cells as null).
fn nullable_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Whole(u64),
    Fractional(f64),
    Text(String),
}

/// Counts arrive as integers, floats (`15.0`), digit strings, or null.
/// Fractions truncate; negatives and non-numbers become zero.
fn count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<RawCount>::deserialize(deserializer)? {
        None => 0,
        Some(RawCount::Whole(n)) => n,
        Some(RawCount::Fractional(f)) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        Some(RawCount::Fractional(_)) => 0,
        Some(RawCount::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.trunc() as u64)
            .unwrap_or(0),
    };
    Ok(value)
}

// =============================================================================
// DERIVED ROWS
// =============================================================================

/// Synthetic per-tag row produced by the categorize transform.
///
/// Has no start or end; counts are summed over every contributing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRow {
    /// The tag name, displayed as the row title.
    pub title: String,
    pub attendance: u64,
    pub seats_taken: u64,
    pub seats: u64,
    /// Number of records that carried this tag.
    pub contributing: usize,
}

/// Counts normalized to percent of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub attendance: f64,
    pub seats_taken: f64,
    /// Always 100.
    pub seats: f64,
}

/// The subject of a dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowEntry {
    Workshop(WorkshopRecord),
    Aggregate(AggregatedRow),
}

/// One row of pipeline output, consumed by the chart and table adapters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    #[serde(flatten)]
    pub entry: RowEntry,

    /// Present only when the metric is percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayMetrics>,
}

impl DashboardRow {
    pub fn workshop(record: WorkshopRecord) -> Self {
        Self {
            entry: RowEntry::Workshop(record),
            display: None,
        }
    }

    pub fn aggregate(row: AggregatedRow) -> Self {
        Self {
            entry: RowEntry::Aggregate(row),
            display: None,
        }
    }

    /// Attach percentage metrics, keeping the raw counts untouched.
    pub fn with_display(mut self, display: DisplayMetrics) -> Self {
        self.display = Some(display);
        self
    }

    /// Workshop id, `None` for aggregated rows.
    pub fn id(&self) -> Option<i64> {
        match &self.entry {
            RowEntry::Workshop(r) => Some(r.id),
            RowEntry::Aggregate(_) => None,
        }
    }

    pub fn title(&self) -> &str {
        match &self.entry {
            RowEntry::Workshop(r) => &r.title,
            RowEntry::Aggregate(a) => &a.title,
        }
    }

    pub fn attendance(&self) -> u64 {
        match &self.entry {
            RowEntry::Workshop(r) => r.attendance,
            RowEntry::Aggregate(a) => a.attendance,
        }
    }

    pub fn seats_taken(&self) -> u64 {
        match &self.entry {
            RowEntry::Workshop(r) => r.seats_taken,
            RowEntry::Aggregate(a) => a.seats_taken,
        }
    }

    pub fn seats(&self) -> u64 {
        match &self.entry {
            RowEntry::Workshop(r) => r.seats,
            RowEntry::Aggregate(a) => a.seats,
        }
    }

    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        match &self.entry {
            RowEntry::Workshop(r) => Some(r.start.0),
            RowEntry::Aggregate(_) => None,
        }
    }

    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        match &self.entry {
            RowEntry::Workshop(r) => Some(r.end.0),
            RowEntry::Aggregate(_) => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.entry, RowEntry::Aggregate(_))
    }

    /// Values to plot as `(attendance, registrations, capacity)`:
    /// the display metrics when present, the raw counts otherwise.
    pub fn plotted(&self) -> (f64, f64, f64) {
        match self.display {
            Some(d) => (d.attendance, d.seats_taken, d.seats),
            None => (
                self.attendance() as f64,
                self.seats_taken() as f64,
                self.seats() as f64,
            ),
        }
    }
}
