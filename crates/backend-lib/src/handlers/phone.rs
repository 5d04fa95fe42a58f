// ============================
// confmock-backend-lib/src/handlers/phone.rs
// ============================
//! Zoom Phone endpoints. Fixed account-level payloads.
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/phone/account_settings", get(account_settings))
        .route(
            "/phone/outbound_caller_id/customized_numbers",
            get(customized_numbers),
        )
}

async fn account_settings() -> Json<Value> {
    Json(json!({
        "call_live_transcription": {
            "enable": true,
            "locked": false,
            "transcription_start_prompt": {
                "enable": true,
                "audio_id": "audio_1",
                "audio_name": "transcription start prompt",
            },
        },
        "local_survivability_mode": {
            "enable": false,
            "locked": false,
        },
    }))
}

async fn customized_numbers() -> Json<Value> {
    Json(json!({
        "customize_numbers": [{
            "customize_id": "cn_1",
            "phone_number": "+18005550100",
            "display_name": "Main Line",
            "incoming": true,
            "outgoing": true,
        }],
        "next_page_token": "",
        "page_size": 30,
        "total_records": 10,
    }))
}
