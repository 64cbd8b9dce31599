//! Record snapshot endpoints: health, raw records, refresh.

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use rollcall_core::WorkshopRecord;
use rollcall_store::RefreshOutcome;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub generation: u64,
    pub record_count: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub source: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.records.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        generation: snapshot.generation,
        record_count: snapshot.records.len(),
        last_refresh: snapshot.refreshed_at,
        source: state.records.source_description(),
    })
}

/// The current record snapshot, as served to dashboard clients.
pub async fn workshop_records(State(state): State<AppState>) -> Json<Vec<WorkshopRecord>> {
    Json(state.records.records().await.as_ref().clone())
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    pub msg: String,
    #[serde(flatten)]
    pub outcome: RefreshOutcome,
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = state
        .records
        .refresh_if_due(state.refresh_min_interval)
        .await?;

    let msg = match &outcome {
        RefreshOutcome::Installed { record_count, .. } => {
            state.sync_charts().await;
            format!("Refreshed data! {} workshops loaded", record_count)
        }
        RefreshOutcome::Superseded { .. } => {
            "A newer refresh replaced this one before it finished".to_string()
        }
        RefreshOutcome::Throttled { last_refresh } => format!(
            "Data was refreshed in the past {} (last refresh {})",
            describe_interval(state.refresh_min_interval),
            last_refresh.format("%Y-%m-%d %H:%M UTC")
        ),
    };

    info!(refreshed = outcome.is_installed(), msg = %msg, "Refresh requested");
    Ok(Json(RefreshResponse {
        refreshed: outcome.is_installed(),
        msg,
        outcome,
    }))
}

fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        1 => "second".to_string(),
        3600 => "hour".to_string(),
        s if s % 3600 == 0 => format!("{} hours", s / 3600),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{} seconds", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_interval() {
        assert_eq!(describe_interval(Duration::from_secs(86_400)), "24 hours");
        assert_eq!(describe_interval(Duration::from_secs(3600)), "hour");
        assert_eq!(describe_interval(Duration::from_secs(900)), "15 minutes");
        assert_eq!(describe_interval(Duration::from_secs(45)), "45 seconds");
    }
}
