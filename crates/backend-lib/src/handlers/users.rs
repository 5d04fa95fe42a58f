// ============================
// confmock-backend-lib/src/handlers/users.rs
// ============================
//! User profile endpoints.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::handlers::{list_envelope, require_str, ListQuery};
use crate::mock;
use crate::pagination::paginate_with;
use crate::storage::EntityKind;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(get_me))
        .route("/users/{user_id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/users/{user_id}/status", put(update_status))
        .route("/users/{user_id}/token", get(get_token).delete(revoke_token))
        .route("/users/{user_id}/settings", get(get_settings).patch(update_settings))
}

async fn list_users(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut users = Vec::new();
    for id in state.store.list_ids(EntityKind::User).await? {
        if let Some(doc) = state.store.load(EntityKind::User, &id).await? {
            users.push(doc);
        }
    }
    // fixture-less installs still get a populated directory
    if users.is_empty() {
        let count = state.settings.default_page_size;
        users = (0..count).map(|_| mock::base_user(state.base_url())).collect();
    }
    if let Some(status) = &query.status {
        users.retain(|user| user.get("status").and_then(Value::as_str) == Some(status.as_str()));
    }
    let page = paginate_with(
        &users,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope("users", page)))
}

async fn create_user(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    // accept both the nested `user_info` shape and a flat body
    let info = body
        .get("user_info")
        .filter(|value| value.is_object())
        .unwrap_or(&body);
    let email = require_str(info, "email")?;
    let first_name = require_str(info, "first_name")?;
    let last_name = require_str(info, "last_name")?;

    let id = mock::random_id();
    let doc = json!({
        "id": id,
        "email": email,
        "first_name": first_name,
        "last_name": last_name,
        "display_name": format!("{first_name} {last_name}"),
        "type": info.get("type").and_then(Value::as_i64).unwrap_or(1),
        "status": "active",
        "timezone": info.get("timezone").and_then(Value::as_str).unwrap_or("America/New_York"),
        "created_at": mock::now_ts(),
        "meeting_ids": [],
        "recording_meeting_ids": [],
        "webinar_ids": [],
    });
    state.store.save(EntityKind::User, &id, doc.clone()).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// The token owner. A stored `me` document wins; otherwise a mock
/// profile is stashed so repeat reads stay consistent.
async fn get_me(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    if let Some(doc) = state.store.load(EntityKind::User, "me").await? {
        return Ok(Json(doc));
    }
    let doc = mock::mock_user("me", state.base_url());
    state.store.stash(EntityKind::User, "me", doc.clone());
    Ok(Json(doc))
}

async fn get_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.require_user(&user_id).await?))
}

async fn update_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<StatusCode, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.entity(EntityKind::User, &user_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_user(&user_id).await?;
    if let (Value::Object(target), Value::Object(patch)) = (&mut doc, &patch) {
        for (key, value) in patch {
            if key == "settings" {
                merge_settings(target, value);
            } else {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    state.store.save(EntityKind::User, &user_id, doc).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(EntityKind::User, &user_id).await?;
    state
        .cache
        .invalidate(&crate::cache::keys::chat_user_messages(&user_id));
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let status = match require_str(&body, "action")? {
        "activate" => "active",
        "deactivate" => "inactive",
        other => {
            return Err(ApiError::Validation(format!(
                "action must be activate or deactivate, got {other}"
            )))
        },
    };
    let lock = state.locks.entity(EntityKind::User, &user_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_user(&user_id).await?;
    doc["status"] = json!(status);
    state.store.save(EntityKind::User, &user_id, doc).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_token(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.require_user(&user_id).await?;
    Ok(Json(json!({"token": format!("zak_{}", mock::random_string(32))})))
}

async fn revoke_token(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.require_user(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn default_settings() -> Value {
    json!({
        "schedule_meeting": {
            "host_video": true,
            "participants_video": false,
            "audio_type": "both",
            "join_before_host": false,
        },
        "in_meeting": {
            "chat": true,
            "screen_sharing": true,
            "waiting_room": true,
        },
        "email_notification": {
            "cloud_recording_available_reminder": true,
        },
        "recording": {
            "cloud_recording": true,
            "auto_recording": "none",
        },
    })
}

/// Merge stored per-user overrides over the defaults, one section deep.
fn merge_settings(target: &mut Map<String, Value>, overrides: &Value) {
    let merged = target
        .entry("settings")
        .or_insert_with(|| Value::Object(Map::new()));
    if let (Value::Object(merged), Value::Object(overrides)) = (merged, overrides) {
        for (section, incoming) in overrides {
            match (merged.get_mut(section), incoming) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    for (key, value) in incoming {
                        existing.insert(key.clone(), value.clone());
                    }
                },
                _ => {
                    merged.insert(section.clone(), incoming.clone());
                },
            }
        }
    }
}

async fn get_settings(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.require_user(&user_id).await?;
    let mut settings = json!({"settings": default_settings()});
    if let (Value::Object(wrapper), Some(overrides)) = (&mut settings, doc.get("settings")) {
        merge_settings(wrapper, overrides);
    }
    Ok(Json(settings["settings"].clone()))
}

async fn update_settings(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<StatusCode, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.entity(EntityKind::User, &user_id);
    let _guard = lock.lock().await;

    let mut doc = state.require_user(&user_id).await?;
    if let Value::Object(target) = &mut doc {
        merge_settings(target, &patch);
    }
    state.store.save(EntityKind::User, &user_id, doc).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_settings_keeps_unrelated_sections() {
        let mut doc = json!({"settings": {
            "in_meeting": {"chat": true, "screen_sharing": true},
        }});
        let Value::Object(target) = &mut doc else { unreachable!() };
        merge_settings(target, &json!({"in_meeting": {"chat": false}}));

        assert_eq!(doc["settings"]["in_meeting"]["chat"], false);
        assert_eq!(doc["settings"]["in_meeting"]["screen_sharing"], true);
    }
}
