// ============================
// confmock-backend-lib/src/handlers/calendar.rs
// ============================
//! Calendar endpoints, Google-calendar wire shapes. Entirely
//! synthesized; nothing here touches the store.
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::require_str;
use crate::mock;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/calendars", post(create_calendar))
        .route("/calendars/colors", get(get_colors))
        .route("/calendars/freeBusy", post(query_free_busy))
        .route("/calendars/users/{user_id}/calendarList", get(list_user_calendars))
        .route(
            "/calendars/{cal_id}",
            get(get_calendar).patch(update_calendar).delete(delete_calendar),
        )
        .route("/calendars/{cal_id}/acl", get(list_acl).post(create_acl))
        .route("/calendars/{cal_id}/acl/{acl_id}", get(get_acl).delete(delete_acl))
        .route("/calendars/{cal_id}/events", get(list_events).post(create_event))
        .route("/calendars/{cal_id}/events/import", post(import_event))
        .route("/calendars/{cal_id}/events/quickAdd", post(quick_add_event))
        .route(
            "/calendars/{cal_id}/events/{event_id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/calendars/{cal_id}/events/{event_id}/move", post(move_event))
}

fn etag() -> String {
    format!("\"{}\"", mock::random_string(20))
}

fn generated_id() -> String {
    format!("{}@zoom.com", mock::random_string(10))
}

async fn create_calendar(body: Option<Json<Value>>) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let summary = require_str(&body, "summary")?;
    Ok(Json(json!({
        "kind": "calendar#calendar",
        "etag": etag(),
        "id": generated_id(),
        "summary": summary,
        "timeZone": "America/Los_Angeles",
        "description": "calendar description",
        "location": "San Jose",
    })))
}

async fn get_calendar(Path(cal_id): Path<String>) -> Json<Value> {
    Json(json!({
        "kind": "calendar#calendar",
        "etag": etag(),
        "id": cal_id,
        "summary": "My calendar",
        "timeZone": "America/Los_Angeles",
        "description": "calendar description",
        "location": "San Jose",
    }))
}

async fn update_calendar(
    Path(cal_id): Path<String>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    Json(json!({
        "kind": "calendar#calendar",
        "etag": etag(),
        "id": cal_id,
        "summary": body.get("summary").and_then(Value::as_str).unwrap_or("Updated calendar"),
        "timeZone": body.get("timeZone").and_then(Value::as_str).unwrap_or("America/Los_Angeles"),
        "description": body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("Updated description"),
        "location": body.get("location").and_then(Value::as_str).unwrap_or("Updated location"),
    }))
}

async fn delete_calendar(Path(_cal_id): Path<String>) -> axum::http::StatusCode {
    axum::http::StatusCode::NO_CONTENT
}

fn random_acl_rule() -> Value {
    let scope_types = ["user", "group", "domain"];
    let roles = ["none", "freeBusyReader", "reader", "writer", "owner"];
    let mut rng = rand::thread_rng();
    json!({
        "kind": "calendar#aclRule",
        "etag": etag(),
        "id": format!("user:{}", generated_id()),
        "scope": {
            "type": scope_types[rng.gen_range(0..scope_types.len())],
            "value": format!("{}@zoom.us", mock::random_string(8)),
        },
        "role": roles[rng.gen_range(0..roles.len())],
    })
}

async fn list_acl(Path(_cal_id): Path<String>) -> Json<Value> {
    let count = rand::thread_rng().gen_range(1..=5);
    let rules: Vec<Value> = (0..count).map(|_| random_acl_rule()).collect();
    Json(json!({"kind": "calendar#acl", "etag": etag(), "items": rules}))
}

async fn create_acl(
    Path(_cal_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let scope = body
        .get("scope")
        .ok_or_else(|| ApiError::Validation("scope is required".to_string()))?;
    let role = require_str(&body, "role")?;
    Ok(Json(json!({
        "kind": "calendar#aclRule",
        "etag": etag(),
        "id": format!("user:{}", generated_id()),
        "scope": scope,
        "role": role,
    })))
}

async fn get_acl(Path((_cal_id, acl_id)): Path<(String, String)>) -> Json<Value> {
    Json(json!({
        "kind": "calendar#aclRule",
        "etag": etag(),
        "id": acl_id,
        "scope": {"type": "user", "value": format!("{}@zoom.us", mock::random_string(8))},
        "role": "reader",
    }))
}

async fn delete_acl(Path(_ids): Path<(String, String)>) -> axum::http::StatusCode {
    axum::http::StatusCode::NO_CONTENT
}

async fn list_user_calendars(
    State(_state): State<SharedState>,
    Path(_user_id): Path<String>,
) -> Json<Value> {
    let count = rand::thread_rng().gen_range(1..=10);
    let calendars: Vec<Value> = (0..count).map(|_| mock::calendar_entry()).collect();
    Json(json!({"kind": "calendar#calendarList", "items": calendars}))
}

async fn query_free_busy(body: Option<Json<Value>>) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let time_min = require_str(&body, "timeMin")?;
    let time_max = require_str(&body, "timeMax")?;
    let window_start = chrono::DateTime::parse_from_rfc3339(time_min)
        .map_err(|_| ApiError::Validation("timeMin must be an RFC 3339 timestamp".to_string()))?
        .with_timezone(&Utc);
    let window_end = chrono::DateTime::parse_from_rfc3339(time_max)
        .map_err(|_| ApiError::Validation("timeMax must be an RFC 3339 timestamp".to_string()))?
        .with_timezone(&Utc);

    let mut calendars = serde_json::Map::new();
    for item in body.get("items").and_then(Value::as_array).unwrap_or(&Vec::new()) {
        let Some(cal_id) = item.get("id").and_then(Value::as_str) else {
            continue;
        };
        let mut busy = Vec::new();
        let periods = rand::thread_rng().gen_range(0..=5);
        for _ in 0..periods {
            let offset = rand::thread_rng().gen_range(0..=24);
            let length = rand::thread_rng().gen_range(1..=3);
            let start = window_start + Duration::hours(offset);
            let end = start + Duration::hours(length);
            if end <= window_end {
                busy.push(json!({
                    "start": mock::format_ts(start),
                    "end": mock::format_ts(end),
                }));
            }
        }
        calendars.insert(cal_id.to_string(), json!({"busy": busy}));
    }
    Ok(Json(json!({
        "kind": "calendar#freeBusy",
        "timeMin": time_min,
        "timeMax": time_max,
        "calendars": calendars,
    })))
}

async fn get_colors() -> Json<Value> {
    Json(json!({
        "kind": "calendar#colors",
        "calendar": [
            {"color_id": "1", "value": {"foreground": "#FD3D4A", "background": "#F7F9FA"}}
        ],
        "event": [
            {"color_id": "1", "value": {"foreground": "#FD3D4A", "background": "#F7F9FA"}}
        ],
    }))
}

fn event_window(days_ahead: i64) -> (String, String) {
    let start = Utc::now() + Duration::days(days_ahead);
    (mock::format_ts(start), mock::format_ts(start + Duration::hours(1)))
}

async fn list_events(Path(_cal_id): Path<String>) -> Json<Value> {
    let count = rand::thread_rng().gen_range(1..=5);
    let events: Vec<Value> = (0..count)
        .map(|_| {
            let days = rand::thread_rng().gen_range(1..=30);
            let (start, end) = event_window(days);
            json!({
                "kind": "calendar#event",
                "etag": etag(),
                "id": generated_id(),
                "summary": format!("Event {}", mock::random_string(5)),
                "start": {"dateTime": start, "timeZone": "America/Los_Angeles"},
                "end": {"dateTime": end, "timeZone": "America/Los_Angeles"},
            })
        })
        .collect();
    Json(json!({"kind": "calendar#events", "items": events}))
}

async fn create_event(
    Path(_cal_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let summary = require_str(&body, "summary")?;
    let (start, end) = event_window(1);
    Ok(Json(json!({
        "kind": "calendar#event",
        "etag": etag(),
        "id": generated_id(),
        "summary": summary,
        "description": body.get("description").and_then(Value::as_str).unwrap_or(""),
        "location": body.get("location").and_then(Value::as_str).unwrap_or(""),
        "start": body.get("start").cloned().unwrap_or_else(|| {
            json!({"dateTime": start, "timeZone": "America/Los_Angeles"})
        }),
        "end": body.get("end").cloned().unwrap_or_else(|| {
            json!({"dateTime": end, "timeZone": "America/Los_Angeles"})
        }),
        "attendees": body.get("attendees").cloned().unwrap_or_else(|| json!([])),
        "status": "confirmed",
        "visibility": "default",
    })))
}

async fn get_event(Path((_cal_id, event_id)): Path<(String, String)>) -> Json<Value> {
    let (start, end) = event_window(1);
    Json(json!({
        "kind": "calendar#event",
        "etag": etag(),
        "id": event_id,
        "summary": "event title",
        "description": "event description",
        "location": "San Jose",
        "start": {"dateTime": start, "timeZone": "America/Los_Angeles"},
        "end": {"dateTime": end, "timeZone": "America/Los_Angeles"},
        "attendees": [{
            "email": "mark.joe@zoom.com",
            "displayName": "Mark Joe",
            "optional": false,
            "responseStatus": "needsAction",
        }],
        "status": "confirmed",
        "visibility": "default",
    }))
}

async fn update_event(
    Path((_cal_id, event_id)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let (start, end) = event_window(1);
    Json(json!({
        "kind": "calendar#event",
        "etag": etag(),
        "id": event_id,
        "summary": body.get("summary").and_then(Value::as_str).unwrap_or("Updated Event"),
        "start": body.get("start").cloned().unwrap_or_else(|| {
            json!({"dateTime": start, "timeZone": "America/Los_Angeles"})
        }),
        "end": body.get("end").cloned().unwrap_or_else(|| {
            json!({"dateTime": end, "timeZone": "America/Los_Angeles"})
        }),
        "status": "confirmed",
    }))
}

async fn delete_event(Path(_ids): Path<(String, String)>) -> axum::http::StatusCode {
    axum::http::StatusCode::NO_CONTENT
}

async fn import_event(
    Path(_cal_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let start = body
        .get("start")
        .ok_or_else(|| ApiError::Validation("start is required".to_string()))?;
    let end = body
        .get("end")
        .ok_or_else(|| ApiError::Validation("end is required".to_string()))?;
    Ok(Json(json!({
        "kind": "calendar#event",
        "etag": etag(),
        "id": generated_id(),
        "summary": body.get("summary").and_then(Value::as_str).unwrap_or("Imported Event"),
        "description": body.get("description").and_then(Value::as_str).unwrap_or(""),
        "location": body.get("location").and_then(Value::as_str).unwrap_or(""),
        "start": start,
        "end": end,
        "attendees": body.get("attendees").cloned().unwrap_or_else(|| json!([])),
        "status": body.get("status").and_then(Value::as_str).unwrap_or("confirmed"),
        "visibility": body.get("visibility").and_then(Value::as_str).unwrap_or("default"),
    })))
}

#[derive(Debug, Deserialize)]
struct QuickAddQuery {
    text: Option<String>,
}

async fn quick_add_event(
    Path(_cal_id): Path<String>,
    Query(query): Query<QuickAddQuery>,
) -> Result<Json<Value>, ApiError> {
    let text = query
        .text
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::Validation("text query parameter is required".to_string()))?;
    let (start, end) = event_window(1);
    Ok(Json(json!({
        "kind": "calendar#event",
        "etag": etag(),
        "id": generated_id(),
        "summary": text,
        "start": {"dateTime": start, "timeZone": "America/Los_Angeles"},
        "end": {"dateTime": end, "timeZone": "America/Los_Angeles"},
    })))
}

#[derive(Debug, Deserialize)]
struct MoveQuery {
    destination: Option<String>,
}

async fn move_event(
    Path((_cal_id, event_id)): Path<(String, String)>,
    Query(query): Query<MoveQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.destination.as_deref().unwrap_or("").is_empty() {
        return Err(ApiError::Validation(
            "destination query parameter is required".to_string(),
        ));
    }
    let (start, end) = event_window(1);
    Ok(Json(json!({
        "kind": "calendar#event",
        "etag": etag(),
        "id": event_id,
        "summary": "Moved Event",
        "start": {"dateTime": start, "timeZone": "America/Los_Angeles"},
        "end": {"dateTime": end, "timeZone": "America/Los_Angeles"},
    })))
}
