//! Assembly of workshop records from a raw calendar export.
//!
//! The calendar hands over two flat lists: events and registrations. This
//! module merges them into [`WorkshopRecord`]s:
//!
//! - events are deduplicated by id (first wins) and cut off at a start date
//! - registrations are deduplicated by booking id, an attended copy wins
//! - attendance is the number of attended registrations per event
//! - tags come from a keyword table matched against title, description, and
//!   id, followed by the event's calendar categories
//!
//! Output is sorted by start.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rollcall_core::defaults::INGEST_CUTOFF;
use rollcall_core::{FlexibleTimestamp, WorkshopRecord};

/// Description text after this marker never contributes to keyword tags.
const PREREQUISITES_MARKER: &str = "Prerequisites:";

/// Calendar categories too generic to be useful as tags.
const GENERIC_CATEGORIES: &[&str] = &[
    "Data Workshop > Research Computing Data Workshop",
    "Data Workshop",
    "Workshop",
];

// =============================================================================
// RAW EXPORT TYPES
// =============================================================================

/// Calendar category attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCategory {
    pub name: String,
}

/// One event as exported by the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub presenter: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: FlexibleTimestamp,
    pub end: FlexibleTimestamp,
    #[serde(default)]
    pub seats: Option<f64>,
    /// Registration count reported by the calendar, if any.
    #[serde(default)]
    pub seats_taken: Option<f64>,
    #[serde(default)]
    pub category: Vec<CalendarCategory>,
}

/// One registration as exported by the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub booking_id: i64,
    /// Event the booking belongs to.
    pub event_id: i64,
    /// `1` when the registrant showed up.
    #[serde(default)]
    pub attendance: Option<f64>,
}

impl Registration {
    pub fn attended(&self) -> bool {
        self.attendance == Some(1.0)
    }
}

// =============================================================================
// TAG RULES
// =============================================================================

/// A tag applied when any of its keywords occurs in the event text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

impl TagRule {
    pub fn new(tag: &str, keywords: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered keyword table; tags are emitted in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRules(pub Vec<TagRule>);

impl Default for TagRules {
    fn default() -> Self {
        Self(vec![
            TagRule::new("Python", &["python", "pandas", "numpy", "scipy", "matplotlib"]),
            TagRule::new("Matlab", &["matlab"]),
            TagRule::new("SQL", &["sql"]),
            TagRule::new("Deep Learning", &["deep learning"]),
            TagRule::new(
                "Machine Learning",
                &[
                    "machine learning",
                    "deep learning",
                    "scikit-learn",
                    "tensorflow",
                    "keras",
                ],
            ),
            TagRule::new("Containers", &["docker", "kubernetes", "container"]),
            TagRule::new("Slurm", &["slurm"]),
            TagRule::new("CLI", &["command line", "cli", "shell scripting"]),
            // core series identified by event id
            TagRule::new(
                "HPC Core",
                &[
                    "11890719", "11890924", "12423016", "12423080", "12889799", "13832854",
                    "13838434",
                ],
            ),
            TagRule::new("Bioinformatics", &["bioinformatics", "drug discovery"]),
        ])
    }
}

impl TagRules {
    /// Keyword tags for one event.
    pub fn tags_for(&self, id: i64, title: &str, description: &str) -> Vec<String> {
        let summary = description
            .split(PREREQUISITES_MARKER)
            .next()
            .unwrap_or_default();
        let text = format!(
            "{} {} {}",
            title.to_lowercase(),
            summary.to_lowercase(),
            id
        );

        self.0
            .iter()
            .filter(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|rule| rule.tag.clone())
            .collect()
    }
}

// =============================================================================
// ASSEMBLY
// =============================================================================

/// Knobs for [`assemble_records`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Events whose local start date is earlier are dropped.
    pub cutoff: NaiveDate,
    pub rules: TagRules,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            cutoff: NaiveDate::parse_from_str(INGEST_CUTOFF, "%Y-%m-%d").unwrap_or_default(),
            rules: TagRules::default(),
        }
    }
}

/// Keep one registration per booking, preferring an attended copy.
pub fn dedup_registrations(registrations: Vec<Registration>) -> Vec<Registration> {
    let mut by_booking: HashMap<i64, Registration> = HashMap::new();
    let mut order: Vec<i64> = Vec::new();

    for registration in registrations {
        match by_booking.entry(registration.booking_id) {
            Entry::Occupied(mut existing) => {
                if !existing.get().attended() && registration.attended() {
                    existing.insert(registration);
                }
            }
            Entry::Vacant(slot) => {
                order.push(registration.booking_id);
                slot.insert(registration);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|booking| by_booking.remove(&booking))
        .collect()
}

/// Merge events and registrations into sorted workshop records.
pub fn assemble_records(
    events: Vec<CalendarEvent>,
    registrations: Vec<Registration>,
    options: &IngestOptions,
) -> Vec<WorkshopRecord> {
    let event_count = events.len();
    let registrations = dedup_registrations(registrations);

    // event id -> (registered, attended)
    let mut per_event: HashMap<i64, (u64, u64)> = HashMap::new();
    for registration in &registrations {
        let entry = per_event.entry(registration.event_id).or_default();
        entry.0 += 1;
        if registration.attended() {
            entry.1 += 1;
        }
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut records: Vec<WorkshopRecord> = Vec::with_capacity(events.len());

    for event in events {
        if !seen.insert(event.id) {
            debug!(record_id = event.id, "Duplicate calendar event skipped");
            continue;
        }
        if event.start.date_naive() < options.cutoff {
            continue;
        }

        let description = event.description.unwrap_or_default();
        let mut tags = options.rules.tags_for(event.id, &event.title, &description);
        tags.extend(
            event
                .category
                .into_iter()
                .map(|c| c.name)
                .filter(|name| !GENERIC_CATEGORIES.contains(&name.as_str())),
        );

        let (registered, attended) = per_event.get(&event.id).copied().unwrap_or_default();

        let record = WorkshopRecord {
            id: event.id,
            title: event.title,
            presenter: event.presenter.unwrap_or_default(),
            description,
            tags,
            start: event.start,
            end: event.end,
            seats: whole(event.seats),
            seats_taken: event.seats_taken.map(|n| whole(Some(n))).unwrap_or(registered),
            attendance: attended,
        };

        if let Err(e) = record.validate() {
            warn!(record_id = record.id, error = %e, "Calendar event rejected");
            continue;
        }
        records.push(record);
    }

    records.sort_by_key(|r| r.start.timestamp_millis());

    info!(
        event_count,
        registration_count = registrations.len(),
        record_count = records.len(),
        "Calendar export assembled"
    );

    records
}

fn whole(value: Option<f64>) -> u64 {
    match value {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc() as u64,
        _ => 0,
    }
}
