// ============================
// confmock-backend-lib/src/handlers/groups.rs
// ============================
//! User-group endpoints. Stateless echoes.
use axum::{
    extract::Path,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::require_str;
use crate::mock;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{group_id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/groups/{group_id}/members", get(list_members).post(add_members))
        .route(
            "/groups/{group_id}/members/{member_id}",
            axum::routing::delete(remove_member),
        )
}

async fn list_groups() -> Json<Value> {
    Json(json!({
        "total_records": 1,
        "groups": [{"id": "g1", "name": "All Users", "total_members": 3}],
    }))
}

async fn create_group(body: Option<Json<Value>>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let name = require_str(&body, "name")?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": mock::random_string(16),
            "name": name,
            "total_members": 0,
        })),
    ))
}

async fn get_group(Path(group_id): Path<String>) -> Json<Value> {
    Json(json!({"id": group_id, "name": "All Users", "total_members": 3}))
}

async fn update_group(
    Path(group_id): Path<String>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    Json(json!({
        "id": group_id,
        "name": body.get("name").and_then(Value::as_str).unwrap_or("All Users"),
        "total_members": 3,
    }))
}

async fn delete_group(Path(_group_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_members(Path(_group_id): Path<String>) -> Json<Value> {
    Json(json!({"total_records": 0, "members": []}))
}

async fn add_members(
    Path(_group_id): Path<String>,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let ids: Vec<Value> = body
        .get("members")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|member| member.get("id").cloned())
                .collect()
        })
        .unwrap_or_default();
    (StatusCode::CREATED, Json(json!({"ids": ids})))
}

async fn remove_member(Path(_ids): Path<(String, String)>) -> StatusCode {
    StatusCode::NO_CONTENT
}
