//! HTTP handlers, shared state, and error mapping.

pub mod charts;
pub mod records;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tokio::sync::Mutex;
use tracing::debug;

use rollcall_store::{ChartBlobStore, ChartConfigurationStore, RecordStore};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordStore>,
    pub charts: Arc<Mutex<ChartConfigurationStore>>,
    pub blobs: Arc<dyn ChartBlobStore>,
    pub refresh_min_interval: Duration,
}

impl AppState {
    /// Chart slots start from whatever snapshot `records` currently holds.
    pub async fn new(
        records: Arc<RecordStore>,
        blobs: Arc<dyn ChartBlobStore>,
        refresh_min_interval: Duration,
    ) -> Self {
        let snapshot = records.snapshot().await;
        let charts = ChartConfigurationStore::new(snapshot.records, snapshot.generation);
        Self {
            records,
            charts: Arc::new(Mutex::new(charts)),
            blobs,
            refresh_min_interval,
        }
    }

    /// Hand the latest record snapshot to the chart slots if they are behind.
    pub async fn sync_charts(&self) {
        let snapshot = self.records.snapshot().await;
        let mut charts = self.charts.lock().await;
        if snapshot.generation > charts.generation() {
            debug!(
                from = charts.generation(),
                to = snapshot.generation,
                "Chart slots moved to new record snapshot"
            );
            charts.replace_records(snapshot.records, snapshot.generation);
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Internal(rollcall_core::Error),
    Upstream(String),
    NotFound(String),
    BadRequest(String),
}

impl From<rollcall_core::Error> for ApiError {
    fn from(err: rollcall_core::Error) -> Self {
        match err {
            rollcall_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            rollcall_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            rollcall_core::Error::Parse(e) => ApiError::BadRequest(e.to_string()),
            rollcall_core::Error::Source(msg) => ApiError::Upstream(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{Error, ParseError};

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::NotFound("chart slot 'x'".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (
                Error::Parse(ParseError::ClockWindow("9-5".into())),
                StatusCode::BAD_REQUEST,
            ),
            (Error::Source("down".into()), StatusCode::BAD_GATEWAY),
            (
                Error::Decode("no charts".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
