//! # rollcall-store
//!
//! Stateful side of the rollcall dashboard.
//!
//! This crate provides:
//! - The record store with sequenced refresh (superseded fetches are dropped)
//! - Record sources: HTTP JSON, JSON file, and raw calendar export
//! - Calendar export ingest (registration merge, keyword tagging)
//! - The chart configuration store with per-slot derived output
//! - The versioned configuration blob and its storage backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rollcall_store::{ChartConfigurationStore, JsonFileRecordSource, RecordStore};
//!
//! let store = RecordStore::new(Arc::new(JsonFileRecordSource::new("data/workshops.json")));
//! store.refresh().await?;
//!
//! let snapshot = store.snapshot().await;
//! let mut charts = ChartConfigurationStore::new(snapshot.records, snapshot.generation);
//! let view = charts.active_view();
//! ```

pub mod blob_store;
pub mod chart_config;
pub mod ingest;
pub mod persistence;
pub mod record_store;
pub mod sources;

pub use blob_store::{ChartBlobStore, FileBlobStore, MemoryBlobStore};
pub use chart_config::{ChartConfigurationStore, ChartSlot, DerivedView};
pub use ingest::{assemble_records, CalendarEvent, IngestOptions, Registration, TagRule, TagRules};
pub use persistence::{ChartBlob, DecodedBlob, PersistedChart};
pub use record_store::{RecordSnapshot, RecordStore, RefreshOutcome};
pub use sources::{decode_records, CalendarExportSource, HttpRecordSource, JsonFileRecordSource};
