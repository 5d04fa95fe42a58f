// ============================
// confmock-backend-lib/src/handlers/reports.rs
// ============================
//! Report and account-wide metrics endpoints, all derived from the
//! stored documents at request time.
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::meetings::participants_response;
use crate::handlers::{list_envelope_with, ListQuery};
use crate::pagination::paginate_with;
use crate::storage::EntityKind;
use crate::views;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/report/users", get(report_users))
        .route("/report/daily", get(report_daily))
        .route(
            "/report/meetings/{meeting_id}/participants",
            get(report_meeting_participants),
        )
        .route(
            "/report/webinars/{webinar_id}/participants",
            get(report_webinar_participants),
        )
        .route("/metrics/meetings", get(metrics_meetings))
}

fn user_report_entry(user: &Value) -> Value {
    json!({
        "id": views::str_of(user, "id"),
        "email": views::str_of(user, "email"),
        "first_name": views::str_of(user, "first_name"),
        "last_name": views::str_of(user, "last_name"),
        "type": user.get("type").and_then(Value::as_i64).unwrap_or(1),
        "created_at": views::str_of(user, "created_at"),
        "last_login_time": views::str_of(user, "last_login_time"),
    })
}

async fn report_users(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;

    let mut users = Vec::new();
    for id in state.store.list_ids(EntityKind::User).await? {
        if let Some(user) = state.store.load(EntityKind::User, &id).await? {
            users.push(user);
        }
    }
    if let Some(kind) = &query.kind {
        if kind == "active" || kind == "inactive" {
            users.retain(|user| views::str_of(user, "status") == *kind);
        }
    }
    let entries: Vec<Value> = users.iter().map(user_report_entry).collect();
    let page = paginate_with(
        &entries,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope_with(
        "users",
        page,
        &[("from", json!(from)), ("to", json!(to))],
    )))
}

async fn report_meeting_participants(
    State(state): State<SharedState>,
    Path(meeting_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut out = participants_response(&state, EntityKind::Meeting, &meeting_id, &query).await?;
    out.0["meeting_id"] = json!(meeting_id);
    Ok(out)
}

async fn report_webinar_participants(
    State(state): State<SharedState>,
    Path(webinar_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut out = participants_response(&state, EntityKind::Webinar, &webinar_id, &query).await?;
    out.0["webinar_id"] = json!(webinar_id);
    Ok(out)
}

/// Account-wide meeting metrics: the union of every user's meetings
/// that fall inside the window.
async fn metrics_meetings(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (from, to) = query.date_window(&state.settings)?;

    let mut docs = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for user_id in state.store.list_ids(EntityKind::User).await? {
        let Some(user) = state.store.load(EntityKind::User, &user_id).await? else {
            continue;
        };
        for meeting_id in views::id_list(&user, "meeting_ids") {
            if !seen.insert(meeting_id.clone()) {
                continue;
            }
            if let Some(doc) = state.load_meeting(&meeting_id).await? {
                docs.push(doc);
            }
        }
    }
    let meetings = views::meetings_in_window(&docs, &from, &to);
    let page = paginate_with(
        &meetings,
        &query.page(),
        state.settings.default_page_size,
        state.settings.max_page_size,
    );
    Ok(Json(list_envelope_with(
        "meetings",
        page,
        &[("from", json!(from)), ("to", json!(to))],
    )))
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    year: Option<String>,
    month: Option<String>,
}

async fn report_daily(Query(query): Query<DailyQuery>) -> Json<Value> {
    let year = query.year.unwrap_or_else(|| "2026".to_string());
    let month = query.month.unwrap_or_else(|| "1".to_string());
    let month_num: u32 = month.parse().unwrap_or(1);

    let dates: Vec<Value> = (1..=3)
        .map(|day| {
            json!({
                "date": format!("{year}-{month_num:02}-{day:02}"),
                "meetings": 2,
                "participants": 10,
                "new_users": 0,
            })
        })
        .collect();
    Json(json!({"year": year, "month": month, "dates": dates}))
}
