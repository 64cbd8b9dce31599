//! Chart slot endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use rollcall_core::{FilterPatch, FilterSpecification};
use rollcall_filter::{ChartDataset, TableView};
use rollcall_store::{ChartConfigurationStore, DerivedView};

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct SlotSummary {
    pub id: String,
    pub active: bool,
    /// Output predates the current record snapshot.
    pub stale: bool,
    pub filters: FilterSpecification,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub active: String,
    pub generation: u64,
    pub charts: Vec<SlotSummary>,
}

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    pub id: String,
    pub filters: FilterSpecification,
    pub view: DerivedView,
}

impl SlotResponse {
    fn active(charts: &mut ChartConfigurationStore) -> Self {
        let view = charts.active_view().clone();
        Self {
            id: charts.active_id().to_string(),
            filters: charts.active_spec().clone(),
            view,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChartRequest {
    #[serde(default)]
    pub filters: Option<FilterSpecification>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub saved: bool,
    pub slot_count: usize,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub restored: bool,
    pub active: String,
    pub slot_count: usize,
}

pub async fn list_charts(State(state): State<AppState>) -> Json<ChartsResponse> {
    let charts = state.charts.lock().await;
    let generation = charts.generation();
    let active = charts.active_id().to_string();
    Json(ChartsResponse {
        charts: charts
            .slots()
            .iter()
            .map(|slot| SlotSummary {
                id: slot.id().to_string(),
                active: slot.id() == active,
                stale: slot.is_stale(generation),
                filters: slot.spec().clone(),
            })
            .collect(),
        active,
        generation,
    })
}

/// Create a slot from `{"filters": {...}}`, or from the active slot's
/// filters when the body is empty.
pub async fn create_chart(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SlotResponse>), ApiError> {
    let request: CreateChartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateChartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid chart request: {}", e)))?
    };

    let mut charts = state.charts.lock().await;
    let initial = request
        .filters
        .unwrap_or_else(|| charts.active_spec().clone());
    charts.create_slot(initial);
    Ok((StatusCode::CREATED, Json(SlotResponse::active(&mut charts))))
}

pub async fn set_active(
    State(state): State<AppState>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<SlotResponse>, ApiError> {
    let mut charts = state.charts.lock().await;
    charts.set_active(&request.id)?;
    Ok(Json(SlotResponse::active(&mut charts)))
}

pub async fn update_filters(
    State(state): State<AppState>,
    Json(patch): Json<FilterPatch>,
) -> Json<SlotResponse> {
    let mut charts = state.charts.lock().await;
    if !patch.is_empty() {
        charts.update_active_spec(&patch);
    }
    Json(SlotResponse::active(&mut charts))
}

pub async fn active_dataset(State(state): State<AppState>) -> Json<ChartDataset> {
    let mut charts = state.charts.lock().await;
    Json(charts.active_view().dataset.clone())
}

pub async fn active_table(State(state): State<AppState>) -> Json<TableView> {
    let mut charts = state.charts.lock().await;
    Json(charts.active_view().table.clone())
}

pub async fn save_charts(State(state): State<AppState>) -> Result<Json<SaveResponse>, ApiError> {
    let blob = state.charts.lock().await.serialize();
    state.blobs.save(&blob.encode()?).await?;

    info!(
        slot_count = blob.charts.len(),
        location = %state.blobs.describe(),
        "Chart configuration saved"
    );
    Ok(Json(SaveResponse {
        saved: true,
        slot_count: blob.charts.len(),
        location: state.blobs.describe(),
    }))
}

/// Restore slots from storage. A missing or rejected blob leaves the
/// current slots in place and reports `restored: false`.
pub async fn load_charts(State(state): State<AppState>) -> Result<Json<LoadResponse>, ApiError> {
    let stored = state.blobs.load().await?;
    let mut charts = state.charts.lock().await;
    let restored = charts.restore(stored.as_deref());
    Ok(Json(LoadResponse {
        restored,
        active: charts.active_id().to_string(),
        slot_count: charts.slots().len(),
    }))
}
