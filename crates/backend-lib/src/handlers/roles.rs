// ============================
// confmock-backend-lib/src/handlers/roles.rs
// ============================
//! Role management endpoints over the built-in role set.
use axum::{
    extract::Path,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/{role_id}", get(get_role))
        .route("/roles/{role_id}/members", get(list_members).post(add_members))
        .route("/roles/{role_id}/members/{member_id}", axum::routing::delete(remove_member))
}

fn built_in_roles() -> Vec<Value> {
    vec![
        json!({"id": "0", "name": "Owner", "description": "Account owner", "total_members": 1}),
        json!({"id": "1", "name": "Admin", "description": "Account admin", "total_members": 2}),
        json!({"id": "2", "name": "Member", "description": "Account member", "total_members": 10}),
    ]
}

async fn list_roles() -> Json<Value> {
    let roles = built_in_roles();
    Json(json!({"total_records": roles.len(), "roles": roles}))
}

async fn get_role(Path(role_id): Path<String>) -> Json<Value> {
    built_in_roles()
        .into_iter()
        .find(|role| role.get("id").and_then(Value::as_str) == Some(role_id.as_str()))
        .map(Json)
        .unwrap_or_else(|| {
            Json(json!({
                "id": role_id,
                "name": "Custom Role",
                "description": "",
                "total_members": 0,
            }))
        })
}

async fn list_members(Path(_role_id): Path<String>) -> Json<Value> {
    Json(json!({"total_records": 0, "members": []}))
}

async fn add_members(
    Path(_role_id): Path<String>,
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
