// ============================
// confmock-backend-lib/src/handlers/dashboards.rs
// ============================
//! Dashboard metrics endpoints. Fixed shapes; the QoS summaries live
//! in the qss module.
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::ListQuery;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/metrics/meetings/{meeting_id}/participants", get(meeting_participants))
        .route("/metrics/webinars/{webinar_id}/participants", get(webinar_participants))
        .route("/metrics/crc", get(crc_usage))
        .route("/metrics/zoom_rooms", get(zoom_rooms))
}

async fn meeting_participants(Path(meeting_id): Path<String>) -> Json<Value> {
    Json(json!({
        "page_size": 30,
        "total_records": 1,
        "next_page_token": "",
        "meeting_id": meeting_id,
        "participants": [{
            "id": "dashboard_participant_1",
            "user_name": "Dashboard User",
            "device": "Desktop",
            "ip_address": "127.0.0.1",
            "location": "San Jose, CA",
            "network_type": "Wired",
            "join_time": "2026-01-15T14:00:00Z",
            "leave_time": "2026-01-15T15:00:00Z",
        }],
    }))
}

async fn webinar_participants(Path(webinar_id): Path<String>) -> Json<Value> {
    Json(json!({
        "page_size": 30,
        "total_records": 0,
        "next_page_token": "",
        "webinar_id": webinar_id,
        "participants": [],
    }))
}

async fn crc_usage(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;
    Ok(Json(json!({"from": from, "to": to, "crc_ports_usage": []})))
}

async fn zoom_rooms(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;
    Ok(Json(json!({"from": from, "to": to, "zoom_rooms": []})))
}
