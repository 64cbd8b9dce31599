//! Record source implementations.
//!
//! Every source yields fully decoded records. Individual entries that fail to
//! decode, or that start after they end, are logged and skipped so one bad
//! row never blanks the dashboard.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use rollcall_core::defaults::SOURCE_TIMEOUT_SECS;
use rollcall_core::{Error, RecordSource, Result, WorkshopRecord};

use crate::ingest::{assemble_records, CalendarEvent, IngestOptions, Registration};

/// Decode each element of a JSON array independently, skipping failures.
pub fn decode_each<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>> {
    let Value::Array(items) = value else {
        return Err(Error::Source(format!("expected a JSON array of {}", what)));
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(index, kind = what, error = %e, "Skipping undecodable entry");
                None
            }
        })
        .collect();

    debug!(kind = what, total, decoded = decoded.len(), "Decoded entries");
    Ok(decoded)
}

/// Decode workshop records, dropping any that violate `start <= end`.
pub fn decode_records(value: Value) -> Result<Vec<WorkshopRecord>> {
    let records = decode_each::<WorkshopRecord>(value, "records")?;
    Ok(records
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(record_id = record.id, error = %e, "Skipping invalid record");
                false
            }
        })
        .collect())
}

async fn read_json(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::Source(format!("failed to read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&text)?)
}

// =============================================================================
// HTTP
// =============================================================================

/// Fetches a JSON array of records from an HTTP endpoint.
pub struct HttpRecordSource {
    client: Client,
    url: String,
}

impl HttpRecordSource {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Source(format!("Failed to create HTTP client: {}", e)))?;

        let url = url.into();
        info!("Initializing HTTP record source: url={}", url);

        Ok(Self { client, url })
    }

    pub fn with_default_timeout(url: impl Into<String>) -> Result<Self> {
        Self::new(url, SOURCE_TIMEOUT_SECS)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch_records(&self) -> Result<Vec<WorkshopRecord>> {
        let start = Instant::now();

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Source(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!(
                "Record source returned {}: {}",
                status, body
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| Error::Source(format!("Invalid record payload: {}", e)))?;
        let records = decode_records(value)?;

        debug!(
            record_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched records over HTTP"
        );
        Ok(records)
    }
}

// =============================================================================
// FILES
// =============================================================================

/// Reads a JSON array of records from disk.
pub struct JsonFileRecordSource {
    path: PathBuf,
}

impl JsonFileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileRecordSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_records(&self) -> Result<Vec<WorkshopRecord>> {
        decode_records(read_json(&self.path).await?)
    }
}

/// Builds records from a raw calendar export: an events file and a
/// registrations file, both JSON arrays.
pub struct CalendarExportSource {
    events_path: PathBuf,
    registrations_path: PathBuf,
    options: IngestOptions,
}

impl CalendarExportSource {
    pub fn new(events_path: impl Into<PathBuf>, registrations_path: impl Into<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
            registrations_path: registrations_path.into(),
            options: IngestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl RecordSource for CalendarExportSource {
    fn describe(&self) -> String {
        format!(
            "{} + {}",
            self.events_path.display(),
            self.registrations_path.display()
        )
    }

    async fn fetch_records(&self) -> Result<Vec<WorkshopRecord>> {
        let events: Vec<CalendarEvent> =
            decode_each(read_json(&self.events_path).await?, "events")?;
        let registrations: Vec<Registration> =
            decode_each(read_json(&self.registrations_path).await?, "registrations")?;

        Ok(assemble_records(events, registrations, &self.options))
    }
}
