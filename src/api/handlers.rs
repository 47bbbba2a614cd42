use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::delivery::{DeliveryClient, DeliveryStats};
use crate::engine::{AlertStatus, EngineStats, IngestOutcome, StreamSnapshot, VitalsEngine};
use crate::vitals::VitalEvent;

/// Application state shared across handlers
pub struct AppState {
    pub engine: Arc<VitalsEngine>,
    pub delivery: Arc<DeliveryClient>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Ingestion
// ============================================================================

#[derive(Serialize)]
pub struct IngestResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Status of the transition this sample triggered, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<&'static str>,
}

pub async fn ingest_vital(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VitalEvent>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    // missing kind/streamId, an unknown kind, or a non-numeric value all
    // fail deserialization and end here
    let Json(event) = payload.map_err(|e| {
        tracing::warn!(error = %e, "Rejecting malformed vital event");
        ApiError::BadRequest(e.body_text())
    })?;

    let now = chrono::Utc::now().timestamp_millis();
    let response = match state.engine.ingest(&event, now) {
        IngestOutcome::Accepted { transition } => IngestResponse {
            accepted: true,
            reason: None,
            transition: transition.map(|status| match status {
                AlertStatus::Entered => "entered",
                AlertStatus::Resolved => "resolved",
            }),
        },
        IngestOutcome::Implausible => IngestResponse {
            accepted: false,
            reason: Some("implausible_value"),
            transition: None,
        },
    };

    Ok(Json(response))
}

// ============================================================================
// Streams
// ============================================================================

#[derive(Serialize)]
pub struct StreamsResponse {
    pub count: usize,
    pub streams: Vec<StreamSnapshot>,
}

pub async fn list_streams(State(state): State<Arc<AppState>>) -> Json<StreamsResponse> {
    let now = chrono::Utc::now().timestamp_millis();
    let streams = state.engine.registry().snapshots(now);

    Json(StreamsResponse {
        count: streams.len(),
        streams,
    })
}

pub async fn stream_detail(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
) -> Result<Json<StreamSnapshot>, ApiError> {
    let now = chrono::Utc::now().timestamp_millis();
    let snapshot = state
        .engine
        .registry()
        .snapshot_of(&stream_id, now)
        .ok_or_else(|| ApiError::NotFound(format!("Stream '{}' not found", stream_id)))?;

    Ok(Json(snapshot))
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Serialize)]
pub struct StatsResponse {
    pub engine: EngineStats,
    pub delivery: DeliveryStats,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        engine: state.engine.stats(),
        delivery: state.delivery.stats(),
    })
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
