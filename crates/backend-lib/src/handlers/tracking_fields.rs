// ============================
// confmock-backend-lib/src/handlers/tracking_fields.rs
// ============================
//! Tracking-field CRUD over the tracking-fields singleton.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{merge_fields, require_str};
use crate::mock;
use crate::storage::SingletonKey;
use crate::SharedState;

const PATCHABLE: &[&str] = &["field", "value", "visible"];

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/tracking_fields", get(list_fields).post(create_field))
        .route(
            "/tracking_fields/{field_id}",
            get(get_field).patch(update_field).delete(delete_field),
        )
}

async fn load_fields(state: &SharedState) -> Result<Vec<Value>, ApiError> {
    let doc = state.store.load_singleton(SingletonKey::TrackingFields).await?;
    Ok(doc.as_array().cloned().unwrap_or_default())
}

async fn save_fields(state: &SharedState, fields: Vec<Value>) -> Result<(), ApiError> {
    state
        .store
        .save_singleton(SingletonKey::TrackingFields, Value::Array(fields))
        .await?;
    Ok(())
}

async fn list_fields(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let fields = load_fields(&state).await?;
    Ok(Json(json!({
        "total_records": fields.len(),
        "tracking_fields": fields,
    })))
}

async fn create_field(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let field = require_str(&body, "field")?;
    let lock = state.locks.singleton(SingletonKey::TrackingFields);
    let _guard = lock.lock().await;

    let record = json!({
        "id": mock::random_string(16),
        "field": field,
        "value": body.get("value").and_then(Value::as_str).unwrap_or(""),
        "visible": body.get("visible").and_then(Value::as_bool).unwrap_or(true),
    });
    let mut fields = load_fields(&state).await?;
    fields.push(record.clone());
    save_fields(&state, fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_field(
    State(state): State<SharedState>,
    Path(field_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let fields = load_fields(&state).await?;
    fields
        .into_iter()
        .find(|field| field.get("id").and_then(Value::as_str) == Some(field_id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Tracking field", &field_id))
}

async fn update_field(
    State(state): State<SharedState>,
    Path(field_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = body.unwrap_or_else(|| Json(json!({})));
    let lock = state.locks.singleton(SingletonKey::TrackingFields);
    let _guard = lock.lock().await;

    let mut fields = load_fields(&state).await?;
    let field = fields
        .iter_mut()
        .find(|field| field.get("id").and_then(Value::as_str) == Some(field_id.as_str()))
        .ok_or_else(|| ApiError::not_found("Tracking field", &field_id))?;
    merge_fields(field, &patch, PATCHABLE);
    let updated = field.clone();
    save_fields(&state, fields).await?;
    Ok(Json(updated))
}

async fn delete_field(
    State(state): State<SharedState>,
    Path(field_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let lock = state.locks.singleton(SingletonKey::TrackingFields);
    let _guard = lock.lock().await;

    let mut fields = load_fields(&state).await?;
    fields.retain(|field| field.get("id").and_then(Value::as_str) != Some(field_id.as_str()));
    save_fields(&state, fields).await?;
    Ok(StatusCode::NO_CONTENT)
}
