//! # rollcall-filter
//!
//! The filter-and-aggregation engine behind every chart and table.
//!
//! This crate provides:
//! - Per-dimension term predicates evaluated through filter expressions
//! - The fixed-order pipeline (drop, name, time, tags, date, categorize,
//!   metric, chronological sort)
//! - The table variant of the pipeline with categorize forced off
//! - Presentation adapters turning pipeline output into chart datasets,
//!   table visibility, and summary statistics
//!
//! ## Example
//!
//! ```
//! use rollcall_core::{parse_timestamp, FilterSpecification, WorkshopRecord};
//! use rollcall_filter::{apply, ChartDataset};
//!
//! let workshop = |id: i64, title: &str, day: u32, attendance: u64| WorkshopRecord {
//!     id,
//!     title: title.to_string(),
//!     presenter: String::new(),
//!     description: String::new(),
//!     tags: Vec::new(),
//!     start: parse_timestamp(&format!("2024-02-{:02}T09:00:00Z", day)).unwrap().into(),
//!     end: parse_timestamp(&format!("2024-02-{:02}T11:00:00Z", day)).unwrap().into(),
//!     seats: 20,
//!     seats_taken: 15,
//!     attendance,
//! };
//! let records = vec![
//!     workshop(1, "Advanced Python", 3, 9),
//!     workshop(2, "Intro to Git", 1, 12),
//!     workshop(3, "Python Plotting", 2, 0),
//! ];
//!
//! let spec = FilterSpecification::new().with_name("git OR python").dropping_empty(true);
//! let rows = apply(&records, &spec);
//! let dataset = ChartDataset::from_rows(&rows, &spec);
//! assert_eq!(dataset.labels, vec!["Intro to Git", "Advanced Python"]);
//! assert_eq!(dataset.attendance, vec![12.0, 9.0]);
//! ```

pub mod categorize;
pub mod metric;
pub mod pipeline;
pub mod predicates;
pub mod presentation;

pub use categorize::categorize;
pub use metric::{display_metrics, to_percentages};
pub use pipeline::{apply, filter_for_table, select, sort_chronologically};
pub use predicates::{apply_dimension, drop_unattended, name_matches};
pub use presentation::{ChartDataset, RawCounts, RowCaption, SummaryStats, TableView};
