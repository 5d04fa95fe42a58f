// ============================
// confmock-backend-lib/src/handlers/chat.rs
// ============================
//! Team-chat endpoints.
//!
//! Channels live in the `chat_channels` singleton (an object keyed by
//! channel ID); messages live in `chat_messages`, an object of
//! per-channel buckets plus the `_direct_messages` bucket for DMs.
//! `me` in a path resolves to the fixed mock token owner.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::cache::keys;
use crate::error::ApiError;
use crate::handlers::ListQuery;
use crate::locks::LockMap;
use crate::mock;
use crate::pagination::paginate_with;
use crate::storage::SingletonKey;
use crate::{AppState, SharedState};

/// The user the bearer token stands for. Real tokens would carry this.
pub const MOCK_SELF_ID: &str = "mock_user_id";

const DM_BUCKET: &str = "_direct_messages";

const CHAT_DEFAULT_PAGE_SIZE: usize = 50;
const CHAT_MAX_PAGE_SIZE: usize = 200;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/chat/channels", get(list_channels).post(create_channel))
        .route("/chat/channels/search", post(search_channels))
        .route(
            "/chat/channels/{channel_id}",
            get(get_channel).patch(update_channel).delete(delete_channel),
        )
        .route(
            "/chat/channels/{channel_id}/messages",
            get(list_channel_messages).post(send_channel_message),
        )
        .route(
            "/chat/channels/{channel_id}/members",
            get(list_members).post(add_members),
        )
        .route("/chat/channels/{channel_id}/members/me", post(join_channel).delete(leave_channel))
        .route(
            "/chat/channels/{channel_id}/members/{member_id}",
            axum::routing::delete(remove_member),
        )
        .route(
            "/chat/users/{user_id}/messages",
            get(list_user_messages).post(send_user_message),
        )
        .route(
            "/chat/users/{user_id}/messages/{message_id}",
            get(get_user_message)
                .put(update_user_message)
                .patch(update_user_message)
                .delete(delete_user_message),
        )
        .route("/im/chat/messages", post(chatbot_message))
}

fn resolve_user(user_id: &str) -> &str {
    if user_id == "me" {
        MOCK_SELF_ID
    } else {
        user_id
    }
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

async fn load_channels(state: &AppState) -> Result<Map<String, Value>, ApiError> {
    Ok(as_object(state.store.load_singleton(SingletonKey::ChatChannels).await?))
}

async fn load_messages(state: &AppState) -> Result<Map<String, Value>, ApiError> {
    Ok(as_object(state.store.load_singleton(SingletonKey::ChatMessages).await?))
}

fn require_channel<'a>(
    channels: &'a Map<String, Value>,
    channel_id: &str,
) -> Result<&'a Value, ApiError> {
    channels
        .get(channel_id)
        .ok_or_else(|| ApiError::not_found("Channel", channel_id))
}

fn singleton_lock(locks: &LockMap, key: SingletonKey) -> std::sync::Arc<tokio::sync::Mutex<()>> {
    locks.singleton(key)
}

async fn list_channels(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let channels = load_channels(&state).await?;
    let list: Vec<&Value> = channels.values().collect();
    Ok(Json(json!({
        "channels": list,
        "page_size": list.len(),
        "total_records": list.len(),
    })))
}

async fn create_channel(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let name = super::require_str(&body, "name")?;

    let lock = singleton_lock(&state.locks, SingletonKey::ChatChannels);
    let _guard = lock.lock().await;

    let mut channels = load_channels(&state).await?;
    let mut channel_id = (channels.len() + 1).to_string();
    while channels.contains_key(&channel_id) {
        channel_id = mock::random_string(8);
    }
    let channel = json!({
        "id": channel_id,
        "name": name,
        "type": body.get("type").and_then(Value::as_i64).unwrap_or(1),
        "channel_settings": body.get("channel_settings").cloned().unwrap_or_else(|| json!({})),
    });
    channels.insert(channel_id, channel.clone());
    state
        .store
        .save_singleton(SingletonKey::ChatChannels, Value::Object(channels))
        .await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

async fn get_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let channels = load_channels(&state).await?;
    Ok(Json(require_channel(&channels, &channel_id)?.clone()))
}

async fn update_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<StatusCode, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = singleton_lock(&state.locks, SingletonKey::ChatChannels);
    let _guard = lock.lock().await;

    let mut channels = load_channels(&state).await?;
    let mut channel = require_channel(&channels, &channel_id)?.clone();
    if let Some(name) = patch.get("name") {
        channel["name"] = name.clone();
    }
    if let (Some(Value::Object(incoming)), Some(Value::Object(existing))) = (
        patch.get("channel_settings"),
        channel.get_mut("channel_settings"),
    ) {
        for (key, value) in incoming {
            existing.insert(key.clone(), value.clone());
        }
    }
    channels.insert(channel_id, channel);
    state
        .store
        .save_singleton(SingletonKey::ChatChannels, Value::Object(channels))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deleting a channel also drops its message bucket.
async fn delete_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let lock = singleton_lock(&state.locks, SingletonKey::ChatChannels);
    let _guard = lock.lock().await;

    let mut channels = load_channels(&state).await?;
    require_channel(&channels, &channel_id)?;
    channels.remove(&channel_id);
    state
        .store
        .save_singleton(SingletonKey::ChatChannels, Value::Object(channels))
        .await?;

    let mut messages = load_messages(&state).await?;
    if messages.remove(&channel_id).is_some() {
        state
            .store
            .save_singleton(SingletonKey::ChatMessages, Value::Object(messages))
            .await?;
        state.cache.invalidate_prefix("chat_user_messages:");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_channel_messages(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let channels = load_channels(&state).await?;
    require_channel(&channels, &channel_id)?;

    let messages = load_messages(&state).await?;
    let bucket = messages
        .get(&channel_id)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let page = paginate_with(&bucket, &query.page(), CHAT_DEFAULT_PAGE_SIZE, CHAT_MAX_PAGE_SIZE);
    Ok(Json(json!({
        "messages": page.items,
        "page_size": page.items.len(),
        "next_page_token": page.next_page_token,
    })))
}

async fn send_channel_message(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let text = body
        .get("message")
        .or_else(|| body.get("content"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::Validation("message or content is required".to_string()))?
        .to_string();

    let channels = load_channels(&state).await?;
    require_channel(&channels, &channel_id)?;

    let lock = singleton_lock(&state.locks, SingletonKey::ChatMessages);
    let _guard = lock.lock().await;

    let mut messages = load_messages(&state).await?;
    let bucket = messages
        .entry(channel_id.clone())
        .or_insert_with(|| json!([]));
    let message = json!({
        "id": format!("msg_{}", mock::random_string(12)),
        "message": text,
        "sender": MOCK_SELF_ID,
        "timestamp": Utc::now().timestamp_millis(),
    });
    if let Value::Array(bucket) = bucket {
        bucket.push(message.clone());
    }
    state
        .store
        .save_singleton(SingletonKey::ChatMessages, Value::Object(messages))
        .await?;
    state.cache.invalidate(&keys::chat_user_messages(MOCK_SELF_ID));
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_members(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let channels = load_channels(&state).await?;
    let channel = require_channel(&channels, &channel_id)?;
    let members = channel
        .get("members")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Ok(Json(json!({
        "members": members,
        "page_size": members.len(),
        "total_records": members.len(),
    })))
}

async fn add_members(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let lock = singleton_lock(&state.locks, SingletonKey::ChatChannels);
    let _guard = lock.lock().await;

    let mut channels = load_channels(&state).await?;
    let mut channel = require_channel(&channels, &channel_id)?.clone();
    let incoming = body
        .get("members")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let ids: Vec<Value> = incoming
        .iter()
        .map(|member| {
            member
                .get("id")
                .cloned()
                .unwrap_or_else(|| json!(mock::random_id()))
        })
        .collect();
    if let Value::Object(map) = &mut channel {
        let members = map.entry("members").or_insert_with(|| json!([]));
        if let Value::Array(members) = members {
            members.extend(ids.iter().cloned());
        }
    }
    channels.insert(channel_id, channel);
    state
        .store
        .save_singleton(SingletonKey::ChatChannels, Value::Object(channels))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"added_at": Utc::now().timestamp_millis(), "ids": ids})),
    ))
}

async fn remove_member(
    State(state): State<SharedState>,
    Path((channel_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let lock = singleton_lock(&state.locks, SingletonKey::ChatChannels);
    let _guard = lock.lock().await;

    let mut channels = load_channels(&state).await?;
    let mut channel = require_channel(&channels, &channel_id)?.clone();
    if let Some(Value::Array(members)) = channel.get_mut("members") {
        members.retain(|member| member != member_id.as_str());
    }
    channels.insert(channel_id, channel);
    state
        .store
        .save_singleton(SingletonKey::ChatChannels, Value::Object(channels))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn join_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let channels = load_channels(&state).await?;
    require_channel(&channels, &channel_id)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "added_at": Utc::now().timestamp_millis(),
            "id": MOCK_SELF_ID,
            "member_id": format!("member_{MOCK_SELF_ID}"),
        })),
    ))
}

async fn leave_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let channels = load_channels(&state).await?;
    require_channel(&channels, &channel_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_channels(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let needle = body
        .get("needle")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_lowercase();
    let channels = load_channels(&state).await?;
    let found: Vec<&Value> = channels
        .values()
        .filter(|channel| {
            channel
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect();
    Ok(Json(json!({
        "channels": found,
        "page_size": found.len(),
        "total_records": found.len(),
    })))
}

fn messages_for_user(messages: &Map<String, Value>, user_id: &str) -> Vec<Value> {
    let mut out = Vec::new();
    for bucket in messages.values() {
        let Some(bucket) = bucket.as_array() else { continue };
        for message in bucket {
            let sender = message.get("sender").and_then(Value::as_str);
            let receiver = message.get("receiver").and_then(Value::as_str);
            if sender == Some(user_id) || receiver == Some(user_id) {
                out.push(message.clone());
            }
        }
    }
    out
}

async fn list_user_messages(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user_id = resolve_user(&user_id).to_string();
    let value = state
        .cache
        .get_or_compute(&keys::chat_user_messages(&user_id), || async {
            let messages = load_messages(&state).await?;
            let user_messages = messages_for_user(&messages, &user_id);
            Ok(json!({
                "messages": user_messages,
                "page_size": user_messages.len(),
                "next_page_token": "",
            }))
        })
        .await?;
    Ok(Json(value))
}

async fn send_user_message(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let user_id = resolve_user(&user_id).to_string();

    let lock = singleton_lock(&state.locks, SingletonKey::ChatMessages);
    let _guard = lock.lock().await;

    let mut messages = load_messages(&state).await?;
    let message = json!({
        "id": format!("msg_{}", mock::random_string(12)),
        "message": body.get("message").and_then(Value::as_str).unwrap_or(""),
        "sender": MOCK_SELF_ID,
        "receiver": user_id,
        "timestamp": Utc::now().timestamp_millis(),
    });
    let bucket = messages
        .entry(DM_BUCKET.to_string())
        .or_insert_with(|| json!([]));
    if let Value::Array(bucket) = bucket {
        bucket.push(message.clone());
    }
    state
        .store
        .save_singleton(SingletonKey::ChatMessages, Value::Object(messages))
        .await?;
    state.cache.invalidate(&keys::chat_user_messages(&user_id));
    state.cache.invalidate(&keys::chat_user_messages(MOCK_SELF_ID));
    Ok((StatusCode::CREATED, Json(message)))
}

fn message_matches(message: &Value, message_id: &str, user_id: &str) -> bool {
    message.get("id").and_then(Value::as_str) == Some(message_id)
        && (message.get("sender").and_then(Value::as_str) == Some(user_id)
            || message.get("receiver").and_then(Value::as_str) == Some(user_id))
}

async fn get_user_message(
    State(state): State<SharedState>,
    Path((user_id, message_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let user_id = resolve_user(&user_id);
    let messages = load_messages(&state).await?;
    for bucket in messages.values() {
        let Some(bucket) = bucket.as_array() else { continue };
        if let Some(message) = bucket
            .iter()
            .find(|message| message_matches(message, &message_id, user_id))
        {
            return Ok(Json(message.clone()));
        }
    }
    Err(ApiError::not_found("Message", &message_id))
}

async fn update_user_message(
    State(state): State<SharedState>,
    Path((user_id, message_id)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let user_id = resolve_user(&user_id).to_string();

    let lock = singleton_lock(&state.locks, SingletonKey::ChatMessages);
    let _guard = lock.lock().await;

    let mut messages = load_messages(&state).await?;
    let mut updated = None;
    for bucket in messages.values_mut() {
        let Some(bucket) = bucket.as_array_mut() else { continue };
        for message in bucket {
            if message_matches(message, &message_id, &user_id) {
                if let Some(text) = patch.get("message") {
                    message["message"] = text.clone();
                }
                updated = Some(message.clone());
                break;
            }
        }
        if updated.is_some() {
            break;
        }
    }
    let updated = updated.ok_or_else(|| ApiError::not_found("Message", &message_id))?;
    state
        .store
        .save_singleton(SingletonKey::ChatMessages, Value::Object(messages))
        .await?;
    state.cache.invalidate(&keys::chat_user_messages(&user_id));
    state.cache.invalidate(&keys::chat_user_messages(MOCK_SELF_ID));
    Ok(Json(updated))
}

async fn delete_user_message(
    State(state): State<SharedState>,
    Path((user_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let user_id = resolve_user(&user_id).to_string();

    let lock = singleton_lock(&state.locks, SingletonKey::ChatMessages);
    let _guard = lock.lock().await;

    let mut messages = load_messages(&state).await?;
    let mut removed = false;
    for bucket in messages.values_mut() {
        let Some(bucket) = bucket.as_array_mut() else { continue };
        let before = bucket.len();
        bucket.retain(|message| !message_matches(message, &message_id, &user_id));
        if bucket.len() < before {
            removed = true;
            break;
        }
    }
    if !removed {
        return Err(ApiError::not_found("Message", &message_id));
    }
    state
        .store
        .save_singleton(SingletonKey::ChatMessages, Value::Object(messages))
        .await?;
    state.cache.invalidate(&keys::chat_user_messages(&user_id));
    state.cache.invalidate(&keys::chat_user_messages(MOCK_SELF_ID));
    Ok(StatusCode::NO_CONTENT)
}

/// Chatbot echo endpoint: acknowledges any payload with a message ID.
async fn chatbot_message(
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message_id": mock::random_string(24),
            "robot_jid": body
                .get("robot_jid")
                .and_then(Value::as_str)
                .unwrap_or("default_robot@xmpp.zoom.us"),
            "to_jid": body
                .get("to_jid")
                .and_then(Value::as_str)
                .unwrap_or("default_user@xmpp.zoom.us"),
            "sent_time": mock::now_ts(),
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_for_user_spans_buckets() {
        let mut messages = Map::new();
        messages.insert(
            "1".to_string(),
            json!([{"id": "a", "sender": "u1"}, {"id": "b", "sender": "u2"}]),
        );
        messages.insert(
            DM_BUCKET.to_string(),
            json!([{"id": "c", "sender": "u2", "receiver": "u1"}]),
        );
        let found = messages_for_user(&messages, "u1");
        let ids: Vec<&str> = found
            .iter()
            .filter_map(|m| m.get("id").and_then(Value::as_str))
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"a") && ids.contains(&"c"));
    }

    #[test]
    fn test_resolve_user_me_alias() {
        assert_eq!(resolve_user("me"), MOCK_SELF_ID);
        assert_eq!(resolve_user("u1"), "u1");
    }
}
