// HTTP request handlers
use crate::application::pagination;
use crate::domain::event::Event;
use crate::domain::frame::Frame;
use crate::domain::qualifying::{QualifyingResult, Segment};
use crate::domain::session::SessionKey;
use crate::domain::track::{TrackGeometry, TrackStatus};
use crate::error::ReplayError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

const DEFAULT_FRAME_COUNT: usize = 1000;

/// Error boundary: every failure becomes a JSON `detail` body, nothing
/// crashes the serving process. Causes are logged here with context.
pub struct ApiError(ReplayError);

impl From<ReplayError> for ApiError {
    fn from(error: ReplayError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            ReplayError::NotFound(message) => {
                tracing::debug!("not found: {}", message);
                (StatusCode::NOT_FOUND, message.clone())
            }
            ReplayError::InsufficientTelemetry(message) => {
                tracing::error!("insufficient telemetry: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
            ReplayError::Serialization { field, reason } => {
                tracing::error!("serialization failure at `{}`: {}", field, reason);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
            ReplayError::ProviderTimeout(timeout) => {
                tracing::error!("provider timed out after {:?}", timeout);
                (StatusCode::GATEWAY_TIMEOUT, self.0.to_string())
            }
            ReplayError::Cache(cause) => {
                tracing::error!("cache error: {}", cause);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ReplayError::Provider(cause) => {
                tracing::error!("provider/computation error: {:#}", cause);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct TelemetryQuery {
    pub refresh: Option<bool>,
    pub start_frame: Option<usize>,
    pub frame_count: Option<usize>,
}

#[derive(Serialize)]
pub struct RaceTelemetryResponse {
    pub frames: Vec<Frame>,
    pub track_statuses: Vec<TrackStatus>,
    pub driver_colors: BTreeMap<String, [u8; 3]>,
    pub total_laps: u32,
    pub total_frames: usize,
    pub start_frame: usize,
    pub end_frame: usize,
    pub has_more: bool,
}

#[derive(Serialize)]
pub struct QualifyingResultsResponse {
    pub results: Vec<QualifyingResult>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub year: i32,
    pub events: Vec<Event>,
}

/// Service banner
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Race Replay Telemetry API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/healthz",
    }))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Race telemetry with pagination
pub async fn race_telemetry(
    Path((year, round, session_type)): Path<(i32, u32, String)>,
    Query(query): Query<TelemetryQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RaceTelemetryResponse>, ApiError> {
    let key = SessionKey::new(year, round, session_type);
    let refresh = query.refresh.unwrap_or(false);
    let start_frame = query.start_frame.unwrap_or(0);
    let frame_count = query.frame_count.unwrap_or(DEFAULT_FRAME_COUNT);

    let telemetry = state.replay_service.race_telemetry(&key, refresh).await?;
    let page = pagination::paginate(&telemetry.frames, start_frame, frame_count);
    tracing::debug!(
        "{}: {} total frames, returning {}..{}",
        key,
        page.total_frames,
        page.start_frame,
        page.end_frame
    );

    Ok(Json(RaceTelemetryResponse {
        frames: page.frames,
        track_statuses: telemetry.track_statuses,
        driver_colors: telemetry.driver_colors,
        total_laps: telemetry.total_laps,
        total_frames: page.total_frames,
        start_frame: page.start_frame,
        end_frame: page.end_frame,
        has_more: page.has_more,
    }))
}

/// Track boundary geometry
pub async fn track_geometry(
    Path((year, round, session_type)): Path<(i32, u32, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackGeometry>, ApiError> {
    let key = SessionKey::new(year, round, session_type);
    let track = state.replay_service.track_geometry(&key).await?;
    Ok(Json(track))
}

/// Ranked qualifying classification
pub async fn qualifying_results(
    Path((year, round, session_type)): Path<(i32, u32, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<QualifyingResultsResponse>, ApiError> {
    let key = SessionKey::new(year, round, session_type);
    let results = state.qualifying_service.results(&key).await?;
    Ok(Json(QualifyingResultsResponse { results }))
}

/// Speed trace for one driver's best lap in one qualifying segment
pub async fn qualifying_driver_telemetry(
    Path((year, round, session_type, driver_code, segment)): Path<(
        i32,
        u32,
        String,
        String,
        String,
    )>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let key = SessionKey::new(year, round, session_type);
    let segment: Segment = segment.parse()?;
    let telemetry = state
        .qualifying_service
        .driver_segment_telemetry(&key, &driver_code.to_uppercase(), segment)
        .await?;
    Ok(Json(telemetry))
}

/// All race weekends of a season
pub async fn list_events(
    Path(year): Path<i32>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.schedule_service.events(year).await?;
    Ok(Json(EventsResponse { year, events }))
}

/// Only the weekends with a sprint race
pub async fn list_sprint_events(
    Path(year): Path<i32>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.schedule_service.sprint_events(year).await?;
    Ok(Json(EventsResponse { year, events }))
}
