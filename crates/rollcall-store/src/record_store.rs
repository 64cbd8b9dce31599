//! The record store: the current snapshot of workshop records.
//!
//! A snapshot is immutable; a refresh swaps in a whole new one. Refreshes are
//! sequenced by a generation counter: each refresh takes the next number
//! before fetching, and a finished fetch is installed only if no newer
//! refresh has started in the meantime. A superseded result is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use rollcall_core::{RecordSource, Result, WorkshopRecord};

/// One installed set of records.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    pub records: Arc<Vec<WorkshopRecord>>,
    /// Generation of the refresh that produced this snapshot, 0 before the first.
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// What a refresh request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Installed { generation: u64, record_count: usize },
    /// A newer refresh started while this one was fetching.
    Superseded { generation: u64, latest: u64 },
    /// The last refresh is younger than the minimum interval.
    Throttled { last_refresh: DateTime<Utc> },
}

impl RefreshOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

pub struct RecordStore {
    source: Arc<dyn RecordSource>,
    started: AtomicU64,
    snapshot: RwLock<RecordSnapshot>,
}

impl RecordStore {
    /// Create an empty store; call [`RecordStore::refresh`] to load records.
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            started: AtomicU64::new(0),
            snapshot: RwLock::new(RecordSnapshot::default()),
        }
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub async fn snapshot(&self) -> RecordSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn records(&self) -> Arc<Vec<WorkshopRecord>> {
        self.snapshot.read().await.records.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.snapshot.read().await.generation
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.refreshed_at
    }

    /// Fetch from the source and install the result unless superseded.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let generation = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        info!(
            generation,
            source = %self.source.describe(),
            "Record refresh started"
        );

        let records = match self.source.fetch_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!(generation, error = %e, "Record refresh failed");
                return Err(e);
            }
        };

        let mut snapshot = self.snapshot.write().await;
        let latest = self.started.load(Ordering::SeqCst);
        if latest != generation || snapshot.generation > generation {
            info!(
                generation,
                latest,
                record_count = records.len(),
                "Superseded refresh result discarded"
            );
            return Ok(RefreshOutcome::Superseded { generation, latest });
        }

        let record_count = records.len();
        *snapshot = RecordSnapshot {
            records: Arc::new(records),
            generation,
            refreshed_at: Some(Utc::now()),
        };

        info!(
            generation,
            record_count,
            duration_ms = started.elapsed().as_millis() as u64,
            "Record refresh installed"
        );
        Ok(RefreshOutcome::Installed {
            generation,
            record_count,
        })
    }

    /// Refresh only when the last installed refresh is at least `min_interval` old.
    pub async fn refresh_if_due(&self, min_interval: Duration) -> Result<RefreshOutcome> {
        if let Some(last_refresh) = self.last_refresh().await {
            let age = Utc::now().signed_duration_since(last_refresh);
            let due = age
                .to_std()
                .map(|age| age >= min_interval)
                .unwrap_or(false);
            if !due {
                info!(
                    last_refresh = %last_refresh,
                    "Refresh skipped, data refreshed recently"
                );
                return Ok(RefreshOutcome::Throttled { last_refresh });
            }
        }
        self.refresh().await
    }
}
