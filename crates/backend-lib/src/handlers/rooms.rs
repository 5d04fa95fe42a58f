// ============================
// confmock-backend-lib/src/handlers/rooms.rs
// ============================
//! Zoom Rooms endpoints, backed by the rooms singleton document.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{list_envelope, merge_fields, ListQuery};
use crate::mock;
use crate::pagination::paginate_with;
use crate::storage::SingletonKey;
use crate::SharedState;

const PATCHABLE: &[&str] = &["name", "calendar_name", "status", "location_id"];

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route(
            "/rooms/{room_id}",
            get(get_room).patch(update_room).delete(delete_room),
        )
        .route("/rooms/{room_id}/meetings", get(list_room_meetings).post(create_room_meeting))
}

async fn load_rooms(state: &SharedState) -> Result<Vec<Value>, ApiError> {
    let doc = state.store.load_singleton(SingletonKey::Rooms).await?;
    Ok(doc.as_array().cloned().unwrap_or_default())
}

fn find_room<'a>(rooms: &'a [Value], room_id: &str) -> Option<&'a Value> {
    rooms
        .iter()
        .find(|room| room.get("id").and_then(Value::as_str) == Some(room_id))
}

async fn list_rooms(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut rooms = load_rooms(&state).await?;
    if let Some(status) = &query.status {
        rooms.retain(|room| room.get("status").and_then(Value::as_str) == Some(status.as_str()));
    }
    if let Some(location_id) = &query.location_id {
        rooms.retain(|room| {
            room.get("location_id").and_then(Value::as_str) == Some(location_id.as_str())
        });
    }
    let page = paginate_with(
        &rooms,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope("rooms", page)))
}

async fn create_room(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.singleton(SingletonKey::Rooms);
    let _guard = lock.lock().await;

    let room = json!({
        "id": mock::random_string(16),
        "name": body.get("name").and_then(Value::as_str).unwrap_or("New Room"),
        "type": body.get("type").and_then(Value::as_str).unwrap_or("Zoom Room"),
        "location_id": body.get("location_id").and_then(Value::as_str).unwrap_or(""),
        "calendar_name": body.get("calendar_name").and_then(Value::as_str).unwrap_or(""),
        "status": "Offline",
    });
    let mut rooms = load_rooms(&state).await?;
    rooms.push(room.clone());
    state
        .store
        .save_singleton(SingletonKey::Rooms, Value::Array(rooms))
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn get_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let rooms = load_rooms(&state).await?;
    find_room(&rooms, &room_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Room", &room_id))
}

async fn update_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.singleton(SingletonKey::Rooms);
    let _guard = lock.lock().await;

    let mut rooms = load_rooms(&state).await?;
    let room = rooms
        .iter_mut()
        .find(|room| room.get("id").and_then(Value::as_str) == Some(room_id.as_str()))
        .ok_or_else(|| ApiError::not_found("Room", &room_id))?;
    merge_fields(room, &patch, PATCHABLE);
    let updated = room.clone();
    state
        .store
        .save_singleton(SingletonKey::Rooms, Value::Array(rooms))
        .await?;
    Ok(Json(updated))
}

async fn delete_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let lock = state.locks.singleton(SingletonKey::Rooms);
    let _guard = lock.lock().await;

    let mut rooms = load_rooms(&state).await?;
    rooms.retain(|room| room.get("id").and_then(Value::as_str) != Some(room_id.as_str()));
    state
        .store
        .save_singleton(SingletonKey::Rooms, Value::Array(rooms))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_room_meetings(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let rooms = load_rooms(&state).await?;
    find_room(&rooms, &room_id).ok_or_else(|| ApiError::not_found("Room", &room_id))?;
    Ok(Json(json!({"room_id": room_id, "meetings": []})))
}

async fn create_room_meeting(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let rooms = load_rooms(&state).await?;
    find_room(&rooms, &room_id).ok_or_else(|| ApiError::not_found("Room", &room_id))?;

    let meeting_id = mock::random_id();
    let base_url = state.base_url();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": meeting_id,
            "uuid": meeting_id,
            "room_id": room_id,
            "topic": body.get("topic").and_then(Value::as_str).unwrap_or("Room Meeting"),
            "start_time": body
                .get("start_time")
                .and_then(Value::as_str)
                .unwrap_or("2026-01-15T14:00:00Z"),
            "duration": body.get("duration").and_then(Value::as_i64).unwrap_or(60),
            "join_url": format!("{base_url}/j/{meeting_id}"),
        })),
    ))
}
