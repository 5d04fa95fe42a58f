// ============================
// confmock-backend-lib/src/handlers/webinars.rs
// ============================
//! Webinar endpoints. Structurally the meeting surface with webinar
//! shapes: type 5, `/w/` join links, no recording files.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::{json, Value};

use crate::cache::keys;
use crate::error::ApiError;
use crate::handlers::meetings::{
    attach_to_user, detach_from_user, participants_response, polls_create, polls_delete,
    polls_get, polls_list, polls_update, registrants_add, registrants_list,
    registrants_set_status,
};
use crate::handlers::{list_envelope, merge_fields, ListQuery};
use crate::mock;
use crate::pagination::paginate_with;
use crate::storage::EntityKind;
use crate::views;
use crate::SharedState;

const PATCHABLE: &[&str] = &[
    "topic",
    "start_time",
    "duration",
    "timezone",
    "agenda",
    "password",
    "settings",
];

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/users/{user_id}/webinars", get(list_webinars).post(create_webinar))
        .route(
            "/users/{user_id}/webinars/{webinar_id}",
            get(get_user_webinar).patch(update_webinar).delete(delete_webinar),
        )
        .route("/webinars/{webinar_id}", get(get_webinar))
        .route("/past_webinars/{webinar_id}/participants", get(past_participants))
        .route("/past_webinars/{webinar_id}/instances", get(past_instances))
        .route("/webinars/{webinar_id}/polls", get(list_polls).post(create_poll))
        .route(
            "/webinars/{webinar_id}/polls/{poll_id}",
            get(get_poll).patch(update_poll).delete(delete_poll),
        )
        .route(
            "/webinars/{webinar_id}/registrants",
            get(list_registrants).post(add_registrants),
        )
        .route("/webinars/{webinar_id}/registrants/status", patch(registrants_status))
}

async fn list_webinars(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;
    let user = state.require_user(&user_id).await?;

    let mut docs = Vec::new();
    for id in views::id_list(&user, "webinar_ids") {
        if let Some(doc) = state.load_webinar(&id).await? {
            docs.push(doc);
        }
    }
    let webinars = views::webinars_in_window(&docs, &from, &to);
    let page = paginate_with(
        &webinars,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope("webinars", page)))
}

async fn create_webinar(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    state.require_user(&user_id).await?;

    let webinar_id = mock::random_id();
    let base_url = state.base_url();
    let payload = json!({
        "uuid": webinar_id,
        "id": webinar_id,
        "host_id": user_id,
        "topic": body.get("topic").and_then(Value::as_str).unwrap_or("My Webinar"),
        "type": 5,
        "start_time": super::meetings::resolve_start_time(
            body.get("start_time").and_then(Value::as_str),
        ),
        "duration": body.get("duration").and_then(Value::as_i64).unwrap_or(60),
        "timezone": body.get("timezone").and_then(Value::as_str).unwrap_or("America/New_York"),
        "agenda": body.get("agenda").and_then(Value::as_str).unwrap_or(""),
        "created_at": mock::now_ts(),
        "join_url": format!("{base_url}/w/{webinar_id}"),
        "start_url": format!("{base_url}/s/{webinar_id}"),
        "password": body
            .get("password")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| mock::random_string(8)),
        "settings": body.get("settings").cloned().unwrap_or_else(|| json!({})),
    });

    state
        .store
        .save(EntityKind::Webinar, &webinar_id, payload.clone())
        .await?;
    attach_to_user(&state, &user_id, &webinar_id, &["webinar_ids"]).await?;
    Ok((StatusCode::CREATED, Json(payload)))
}

async fn get_webinar(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let value = state
        .cache
        .get_or_compute(&keys::webinar(&webinar_id), || async {
            let doc = state.require_webinar(&webinar_id).await?;
            Ok(views::webinar_detail(&doc))
        })
        .await?;
    Ok(Json(value))
}

/// User-scoped fetch verifies the host; a webinar owned by someone
/// else reads as absent.
async fn get_user_webinar(
    State(state): State<SharedState>,
    Path((user_id, webinar_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_webinar(&webinar_id).await?;
    if views::str_of(&doc, "host_id") != user_id {
        return Err(ApiError::not_found("Webinar", &webinar_id));
    }
    Ok(Json(views::webinar_detail(&doc)))
}

async fn update_webinar(
    State(state): State<SharedState>,
    Path((_user_id, webinar_id)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.entity(EntityKind::Webinar, &webinar_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_webinar(&webinar_id).await?;
    merge_fields(&mut doc, &patch, PATCHABLE);
    state
        .store
        .save(EntityKind::Webinar, &webinar_id, doc.clone())
        .await?;
    state.cache.invalidate(&keys::webinar(&webinar_id));
    Ok(Json(views::webinar_detail(&doc)))
}

async fn delete_webinar(
    State(state): State<SharedState>,
    Path((user_id, webinar_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.require_webinar(&webinar_id).await?;
    state.store.delete(EntityKind::Webinar, &webinar_id).await?;
    detach_from_user(&state, &user_id, &webinar_id, &["webinar_ids"]).await?;
    state.cache.invalidate(&keys::webinar(&webinar_id));
    Ok(StatusCode::NO_CONTENT)
}

async fn past_participants(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    participants_response(&state, EntityKind::Webinar, &webinar_id, &query).await
}

async fn past_instances(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_webinar(&webinar_id).await?;
    Ok(Json(json!({"instances": [{
        "uuid": views::str_of(&doc, "uuid"),
        "start_time": views::str_of(&doc, "start_time"),
    }]})))
}

async fn list_polls(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    polls_list(&state, EntityKind::Webinar, &webinar_id).await
}

async fn create_poll(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    polls_create(&state, EntityKind::Webinar, &webinar_id, body).await
}

async fn get_poll(
    State(state): State<SharedState>,
    Path((webinar_id, poll_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    polls_get(&state, EntityKind::Webinar, &webinar_id, &poll_id).await
}

async fn update_poll(
    State(state): State<SharedState>,
    Path((webinar_id, poll_id)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    polls_update(&state, EntityKind::Webinar, &webinar_id, &poll_id, body).await
}

async fn delete_poll(
    State(state): State<SharedState>,
    Path((webinar_id, poll_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    polls_delete(&state, EntityKind::Webinar, &webinar_id, &poll_id).await
}

async fn list_registrants(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    registrants_list(&state, EntityKind::Webinar, &webinar_id, &query).await
}

async fn add_registrants(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    registrants_add(&state, EntityKind::Webinar, &webinar_id, body, false).await
}

async fn registrants_status(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    registrants_set_status(&state, EntityKind::Webinar, &webinar_id, body).await
}
