// ============================
// confmock-backend-lib/src/handlers/recordings.rs
// ============================
//! Cloud-recording endpoints and the transcript download.
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{list_envelope_with, ListQuery};
use crate::pagination::paginate_with;
use crate::storage::EntityKind;
use crate::views;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/users/{user_id}/recordings", get(list_user_recordings))
        .route("/meetings/{meeting_id}/recordings", get(get_meeting_recordings))
        .route(
            "/meetings/{meeting_id}/recordings/{recording_id}",
            axum::routing::delete(delete_recording),
        )
}

async fn list_user_recordings(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;
    let user = state.require_user(&user_id).await?;

    let mut docs = Vec::new();
    for id in views::recording_meeting_ids(&user) {
        if let Some(doc) = state.load_meeting(&id).await? {
            docs.push(doc);
        }
    }
    let recordings = views::recordings_in_window(&docs, &from, &to);
    let page = paginate_with(
        &recordings,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );

    let mut extras = vec![("from", json!(from)), ("to", json!(to))];
    if query.trash == Some(true) {
        extras.push(("trash", json!(false)));
    }
    Ok(Json(list_envelope_with("meetings", page, &extras)))
}

async fn get_meeting_recordings(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_meeting(&meeting_id).await?;
    let files = doc
        .get("recording_files")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut out = json!({
        "meeting_id": meeting_id,
        "meeting_uuid": views::str_of(&doc, "uuid"),
        "recording_count": files.len(),
        "recording_files": files,
    });
    if query.trash == Some(true) {
        out["trash"] = json!(false);
    }
    Ok(Json(out))
}

async fn delete_recording(
    State(state): State<SharedState>,
    Path((meeting_id, recording_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let lock = state.locks.entity(EntityKind::Meeting, &meeting_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_meeting(&meeting_id).await?;
    if let Some(Value::Array(files)) = doc.get_mut("recording_files") {
        files.retain(|file| file.get("id").and_then(Value::as_str) != Some(recording_id.as_str()));
    }
    state.store.save(EntityKind::Meeting, &meeting_id, doc).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Transcript download, served without authentication. The trailing
/// path segment is ignored; only the meeting ID matters.
pub async fn download_transcript(
    State(state): State<SharedState>,
    Path((meeting_id, _rest)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let doc = state
        .load_meeting(&meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transcript", &meeting_id))?;
    let vtt = views::vtt_for_meeting(&doc)
        .ok_or_else(|| ApiError::not_found("Transcript", &meeting_id))?;
    Ok(([(header::CONTENT_TYPE, "text/vtt")], vtt))
}
