// ============================
// confmock-backend-lib/src/handlers/meetings.rs
// ============================
//! Meeting endpoints, plus the poll/registrant machinery shared with
//! webinars.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};

use crate::cache::keys;
use crate::error::ApiError;
use crate::handlers::{list_envelope, merge_fields, ListQuery};
use crate::mock;
use crate::pagination::paginate_with;
use crate::storage::EntityKind;
use crate::views;
use crate::{AppState, SharedState};

/// Fields a meeting PATCH may touch. Everything else in the stored
/// document (summary, transcript, recordings) survives the update.
const PATCHABLE: &[&str] = &[
    "topic",
    "duration",
    "timezone",
    "agenda",
    "password",
    "start_time",
    "settings",
];

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/users/{user_id}/meetings", get(list_meetings).post(create_meeting))
        .route(
            "/users/{user_id}/meetings/{meeting_id}",
            get(get_user_meeting).patch(update_meeting).delete(delete_meeting),
        )
        .route("/meetings/{meeting_id}", get(get_meeting))
        .route("/meetings/{meeting_id}/meeting_summary", get(get_meeting_summary))
        .route("/past_meetings/{meeting_id}/participants", get(past_participants))
        .route("/past_meetings/{meeting_id}/instances", get(past_instances))
        .route("/meetings/{meeting_id}/polls", get(list_polls).post(create_poll))
        .route(
            "/meetings/{meeting_id}/polls/{poll_id}",
            get(get_poll).patch(update_poll).delete(delete_poll),
        )
        .route(
            "/meetings/{meeting_id}/registrants",
            get(list_registrants).post(add_registrants),
        )
        .route("/meetings/{meeting_id}/registrants/status", patch(registrants_status))
        .route(
            "/meetings/{meeting_id}/livestream",
            get(get_livestream).patch(update_livestream),
        )
}

/// Vendor start-time handling: full timestamps pass through, bare
/// dates land at noon, anything unparseable falls back to tomorrow.
pub(crate) fn resolve_start_time(raw: Option<&str>) -> String {
    let fallback = || mock::format_ts(Utc::now() + Duration::days(1));
    let Some(raw) = raw else { return fallback() };
    if raw.contains('T') {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return mock::format_ts(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return mock::format_ts(naive.and_utc());
        }
        return fallback();
    }
    match NaiveDate::parse_from_str(raw.get(..10).unwrap_or(""), "%Y-%m-%d") {
        Ok(date) => format!("{date}T12:00:00Z"),
        Err(_) => fallback(),
    }
}

fn default_meeting_settings() -> Value {
    json!({
        "host_video": true,
        "participant_video": false,
        "join_before_host": false,
        "mute_upon_entry": true,
        "waiting_room": true,
    })
}

/// Register an entity ID on the owning user under the user's lock.
pub(crate) async fn attach_to_user(
    state: &AppState,
    user_id: &str,
    id: &str,
    list_keys: &[&str],
) -> Result<(), ApiError> {
    let lock = state.locks.entity(EntityKind::User, user_id);
    let _guard = lock.lock().await;

    let mut user = state.require_user(user_id).await?;
    if let Value::Object(map) = &mut user {
        for key in list_keys {
            let ids = map.entry(*key).or_insert_with(|| json!([]));
            if let Value::Array(ids) = ids {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(json!(id));
                }
            }
        }
    }
    state.store.save(EntityKind::User, user_id, user).await
}

/// Drop an entity ID from the owning user's lists.
pub(crate) async fn detach_from_user(
    state: &AppState,
    user_id: &str,
    id: &str,
    list_keys: &[&str],
) -> Result<(), ApiError> {
    let lock = state.locks.entity(EntityKind::User, user_id);
    let _guard = lock.lock().await;

    let Some(mut user) = state.load_user(user_id).await? else {
        return Ok(());
    };
    if let Value::Object(map) = &mut user {
        for key in list_keys {
            if let Some(Value::Array(ids)) = map.get_mut(*key) {
                ids.retain(|existing| existing != id);
            }
        }
    }
    state.store.save(EntityKind::User, user_id, user).await
}

async fn create_meeting(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    state.require_user(&user_id).await?;

    let meeting_id = mock::random_id();
    let mut settings = default_meeting_settings();
    if let Some(overrides) = body.get("settings").and_then(Value::as_object) {
        if let Value::Object(base) = &mut settings {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
        }
    }

    let base_url = state.base_url();
    let mut payload = json!({
        "uuid": meeting_id,
        "id": meeting_id,
        "host_id": user_id,
        "topic": body.get("topic").and_then(Value::as_str).unwrap_or("My Meeting"),
        "type": body.get("type").and_then(Value::as_i64).unwrap_or(2),
        "start_time": resolve_start_time(body.get("start_time").and_then(Value::as_str)),
        "duration": body.get("duration").and_then(Value::as_i64).unwrap_or(60),
        "timezone": body.get("timezone").and_then(Value::as_str).unwrap_or("America/New_York"),
        "agenda": body.get("agenda").and_then(Value::as_str).unwrap_or(""),
        "created_at": mock::now_ts(),
        "join_url": format!("{base_url}/j/{meeting_id}"),
        "start_url": format!("{base_url}/s/{meeting_id}"),
        "password": body
            .get("password")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| mock::random_string(6)),
        "settings": settings,
    });
    for passthrough in ["schedule_for", "template_id"] {
        if let Some(value) = body.get(passthrough) {
            payload[passthrough] = value.clone();
        }
    }

    state
        .store
        .save(EntityKind::Meeting, &meeting_id, payload.clone())
        .await?;
    attach_to_user(
        &state,
        &user_id,
        &meeting_id,
        &["meeting_ids", "recording_meeting_ids"],
    )
    .await?;
    Ok((StatusCode::CREATED, Json(payload)))
}

async fn list_meetings(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;
    let user = state.require_user(&user_id).await?;

    let mut docs = Vec::new();
    for id in views::id_list(&user, "meeting_ids") {
        if let Some(doc) = state.load_meeting(&id).await? {
            docs.push(doc);
        }
    }
    let mut meetings = views::meetings_in_window(&docs, &from, &to);
    if matches!(query.kind.as_deref(), Some("scheduled" | "live" | "upcoming")) {
        meetings.retain(|entry| entry.meeting_type == 2);
    }
    let page = paginate_with(
        &meetings,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope("meetings", page)))
}

async fn cached_detail(state: &AppState, meeting_id: &str) -> Result<Value, ApiError> {
    state
        .cache
        .get_or_compute(&keys::meeting(meeting_id), || async {
            let doc = state.require_meeting(meeting_id).await?;
            Ok(views::meeting_detail(&doc))
        })
        .await
}

async fn get_meeting(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(cached_detail(&state, &meeting_id).await?))
}

async fn get_user_meeting(
    State(state): State<SharedState>,
    Path((_user_id, meeting_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(cached_detail(&state, &meeting_id).await?))
}

async fn get_meeting_summary(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let value = state
        .cache
        .get_or_compute(&keys::meeting_summary(&meeting_id), || async {
            let doc = state.require_meeting(&meeting_id).await?;
            let payload = views::meeting_summary_payload(&doc);

            let start_time = match views::str_of(&doc, "start_time") {
                s if s.is_empty() => "2026-01-15T14:00:00Z".to_string(),
                s => s,
            };
            let mut details = vec![json!({
                "label": "Meeting overview",
                "summary": payload.summary_overview,
            })];
            for (index, point) in payload.summary_details.iter().enumerate() {
                details.push(json!({
                    "label": format!("Point {}", index + 1),
                    "summary": point,
                }));
            }
            Ok(json!({
                "meeting_host_id": views::str_of(&doc, "host_id"),
                "meeting_host_email": views::str_of(&doc, "host_email"),
                "meeting_uuid": payload.meeting_uuid,
                "meeting_id": payload.meeting_id,
                "meeting_topic": payload.meeting_topic,
                "meeting_start_time": start_time,
                "meeting_end_time": start_time,
                "summary_start_time": start_time,
                "summary_end_time": start_time,
                "summary_created_time": start_time,
                "summary_last_modified_time": start_time,
                "summary_title": payload.summary_title,
                "summary_overview": payload.summary_overview,
                "summary_details": details,
                "next_steps": payload.next_steps,
                "edited_summary": {
                    "summary_details": payload.summary_overview,
                    "next_steps": payload.next_steps,
                },
            }))
        })
        .await?;
    Ok(Json(value))
}

async fn update_meeting(
    State(state): State<SharedState>,
    Path((_user_id, meeting_id)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.entity(EntityKind::Meeting, &meeting_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_meeting(&meeting_id).await?;
    merge_fields(&mut doc, &patch, PATCHABLE);
    state
        .store
        .save(EntityKind::Meeting, &meeting_id, doc.clone())
        .await?;
    invalidate_meeting(&state, &meeting_id);
    Ok(Json(views::meeting_detail(&doc)))
}

async fn delete_meeting(
    State(state): State<SharedState>,
    Path((user_id, meeting_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.require_meeting(&meeting_id).await?;
    state.store.delete(EntityKind::Meeting, &meeting_id).await?;
    detach_from_user(
        &state,
        &user_id,
        &meeting_id,
        &["meeting_ids", "recording_meeting_ids"],
    )
    .await?;
    invalidate_meeting(&state, &meeting_id);
    Ok(StatusCode::NO_CONTENT)
}

fn invalidate_meeting(state: &AppState, meeting_id: &str) {
    state.cache.invalidate(&keys::meeting(meeting_id));
    state.cache.invalidate(&keys::meeting_summary(meeting_id));
}

async fn past_participants(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    participants_response(&state, EntityKind::Meeting, &meeting_id, &query).await
}

async fn past_instances(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_meeting(&meeting_id).await?;
    Ok(Json(json!({"meetings": [{
        "uuid": views::str_of(&doc, "uuid"),
        "id": views::str_of(&doc, "id"),
        "start_time": views::str_of(&doc, "start_time"),
    }]})))
}

// ---- shared with webinars ----

pub(crate) async fn participants_response(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    query: &ListQuery,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_entity(kind, id).await?;
    let participants = views::participants_of(&doc);
    let page = paginate_with(
        &participants,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope("participants", page)))
}

pub(crate) fn invalidate_entity(state: &AppState, kind: EntityKind, id: &str) {
    match kind {
        EntityKind::Meeting => invalidate_meeting(state, id),
        EntityKind::Webinar => state.cache.invalidate(&keys::webinar(id)),
        EntityKind::User => {},
    }
}

pub(crate) async fn polls_list(
    state: &AppState,
    kind: EntityKind,
    id: &str,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_entity(kind, id).await?;
    let polls = doc.get("polls").cloned().unwrap_or_else(|| json!([]));
    Ok(Json(json!({"polls": polls})))
}

pub(crate) async fn polls_create(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    body: Value,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lock = state.locks.entity(kind, id);
    let _guard = lock.lock().await;

    let mut doc = state.require_entity(kind, id).await?;
    let poll = json!({
        "id": mock::random_string(16),
        "status": "notstart",
        "title": body.get("title").and_then(Value::as_str).unwrap_or("Poll"),
        "questions": body.get("questions").cloned().unwrap_or_else(|| json!([])),
    });
    if let Value::Object(map) = &mut doc {
        let polls = map.entry("polls").or_insert_with(|| json!([]));
        if let Value::Array(polls) = polls {
            polls.push(poll.clone());
        }
    }
    state.store.save(kind, id, doc).await?;
    invalidate_entity(state, kind, id);
    Ok((StatusCode::CREATED, Json(poll)))
}

pub(crate) async fn polls_get(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    poll_id: &str,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_entity(kind, id).await?;
    doc.get("polls")
        .and_then(Value::as_array)
        .and_then(|polls| {
            polls
                .iter()
                .find(|poll| poll.get("id").and_then(Value::as_str) == Some(poll_id))
        })
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Poll", poll_id))
}

pub(crate) async fn polls_update(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    poll_id: &str,
    patch: Value,
) -> Result<Json<Value>, ApiError> {
    let lock = state.locks.entity(kind, id);
    let _guard = lock.lock().await;

    let mut doc = state.require_entity(kind, id).await?;
    let mut updated = None;
    if let Some(Value::Array(polls)) = doc.get_mut("polls") {
        for poll in polls {
            if poll.get("id").and_then(Value::as_str) == Some(poll_id) {
                merge_fields(poll, &patch, &["title", "questions", "status"]);
                updated = Some(poll.clone());
                break;
            }
        }
    }
    let updated = updated.ok_or_else(|| ApiError::not_found("Poll", poll_id))?;
    state.store.save(kind, id, doc).await?;
    invalidate_entity(state, kind, id);
    Ok(Json(updated))
}

pub(crate) async fn polls_delete(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    poll_id: &str,
) -> Result<StatusCode, ApiError> {
    let lock = state.locks.entity(kind, id);
    let _guard = lock.lock().await;

    let mut doc = state.require_entity(kind, id).await?;
    if let Some(Value::Array(polls)) = doc.get_mut("polls") {
        polls.retain(|poll| poll.get("id").and_then(Value::as_str) != Some(poll_id));
    }
    state.store.save(kind, id, doc).await?;
    invalidate_entity(state, kind, id);
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn registrants_list(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    query: &ListQuery,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_entity(kind, id).await?;
    let registrants = doc
        .get("registrants")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let page = paginate_with(
        &registrants,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope("registrants", page)))
}

pub(crate) async fn registrants_add(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    body: Value,
    with_start_url: bool,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let lock = state.locks.entity(kind, id);
    let _guard = lock.lock().await;

    let mut doc = state.require_entity(kind, id).await?;
    let incoming = body
        .get("registrants")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let added: Vec<Value> = incoming
        .iter()
        .map(|registrant| {
            json!({
                "id": mock::random_id(),
                "email": registrant.get("email").cloned().unwrap_or(Value::Null),
                "first_name": registrant.get("first_name").cloned().unwrap_or(Value::Null),
                "last_name": registrant.get("last_name").cloned().unwrap_or(Value::Null),
                "status": "approved",
            })
        })
        .collect();
    if let Value::Object(map) = &mut doc {
        let stored = map.entry("registrants").or_insert_with(|| json!([]));
        if let Value::Array(stored) = stored {
            stored.extend(added.iter().cloned());
        }
    }
    state.store.save(kind, id, doc).await?;
    invalidate_entity(state, kind, id);

    let mut response = json!({"registrants": added, "id": id});
    if with_start_url {
        response["start_url"] = json!(format!("{}/s/{id}", state.base_url()));
    }
    Ok((StatusCode::CREATED, Json(response)))
}

pub(crate) async fn registrants_set_status(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    body: Value,
) -> Result<Json<Value>, ApiError> {
    let lock = state.locks.entity(kind, id);
    let _guard = lock.lock().await;

    let action = body.get("action").and_then(Value::as_str).unwrap_or("approve");
    let status = match action {
        "deny" => "denied",
        "cancel" => "cancelled",
        _ => "approved",
    };
    let targets: Vec<String> = body
        .get("registrants")
        .and_then(Value::as_array)
        .map(|registrants| {
            registrants
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut doc = state.require_entity(kind, id).await?;
    if let Some(Value::Array(stored)) = doc.get_mut("registrants") {
        for registrant in stored {
            let matches = registrant
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|rid| targets.contains(&rid.to_string()));
            if matches {
                registrant["status"] = json!(status);
            }
        }
    }
    state.store.save(kind, id, doc).await?;
    invalidate_entity(state, kind, id);
    Ok(Json(json!({
        "id": id,
        "registrants": body.get("registrants").cloned().unwrap_or_else(|| json!([])),
    })))
}

// ---- meeting-scoped wrappers over the shared helpers ----

async fn list_polls(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    polls_list(&state, EntityKind::Meeting, &meeting_id).await
}

async fn create_poll(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    polls_create(&state, EntityKind::Meeting, &meeting_id, body).await
}

async fn get_poll(
    State(state): State<SharedState>,
    Path((meeting_id, poll_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    polls_get(&state, EntityKind::Meeting, &meeting_id, &poll_id).await
}

async fn update_poll(
    State(state): State<SharedState>,
    Path((meeting_id, poll_id)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    polls_update(&state, EntityKind::Meeting, &meeting_id, &poll_id, body).await
}

async fn delete_poll(
    State(state): State<SharedState>,
    Path((meeting_id, poll_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    polls_delete(&state, EntityKind::Meeting, &meeting_id, &poll_id).await
}

async fn list_registrants(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    registrants_list(&state, EntityKind::Meeting, &meeting_id, &query).await
}

async fn add_registrants(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    registrants_add(&state, EntityKind::Meeting, &meeting_id, body, true).await
}

async fn registrants_status(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    registrants_set_status(&state, EntityKind::Meeting, &meeting_id, body).await
}

async fn get_livestream(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_meeting(&meeting_id).await?;
    let livestream = doc.get("livestream").cloned().unwrap_or_else(|| {
        json!({"stream_url": "", "stream_key": "", "page_url": ""})
    });
    Ok(Json(livestream))
}

async fn update_livestream(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.entity(EntityKind::Meeting, &meeting_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_meeting(&meeting_id).await?;
    let mut livestream = doc.get("livestream").cloned().unwrap_or_else(|| {
        json!({"stream_url": "", "stream_key": "", "page_url": ""})
    });
    merge_fields(&mut livestream, &patch, &["stream_url", "stream_key", "page_url"]);
    doc["livestream"] = livestream.clone();
    state.store.save(EntityKind::Meeting, &meeting_id, doc).await?;
    invalidate_meeting(&state, &meeting_id);
    Ok(Json(livestream))
}
