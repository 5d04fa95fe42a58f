// ============================
// confmock-backend-lib/src/handlers/devices.rs
// ============================
//! H.323/SIP device endpoints. Stateless echoes over a fixed roster.
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
        .route("/h323/devices", get(list_devices).post(create_device))
        .route(
            "/h323/devices/{device_id}",
            get(get_device).patch(update_device).delete(delete_device),
        )
}

fn sample_device() -> Value {
    json!({
        "id": "device_1",
        "name": "Conference Room Codec",
        "protocol": "H.323",
        "ip": "192.168.1.100",
        "encryption": "auto",
    })
}

async fn list_devices() -> Json<Value> {
    Json(json!({"total_records": 1, "devices": [sample_device()]}))
}

async fn create_device(
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let name = require_str(&body, "name")?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": mock::random_string(16),
            "name": name,
            "protocol": body.get("protocol").and_then(Value::as_str).unwrap_or("H.323"),
            "ip": body.get("ip").and_then(Value::as_str).unwrap_or(""),
            "encryption": body.get("encryption").and_then(Value::as_str).unwrap_or("auto"),
        })),
    ))
}

async fn get_device(Path(device_id): Path<String>) -> Json<Value> {
    let mut device = sample_device();
    device["id"] = json!(device_id);
    Json(device)
}

async fn update_device(
    Path(device_id): Path<String>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let mut device = sample_device();
    device["id"] = json!(device_id);
    for key in ["name", "protocol", "ip", "encryption"] {
        if let Some(value) = body.get(key) {
            device[key] = value.clone();
        }
    }
    Json(device)
}

async fn delete_device(Path(_device_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}
