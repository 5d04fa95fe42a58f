// ============================
// confmock-backend-lib/src/handlers/accounts.rs
// ============================
//! Account endpoints: the account roster singleton plus fixed lock
//! settings.
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::storage::SingletonKey;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account_id}/lock_settings", get(get_lock_settings))
}

async fn list_accounts(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load_singleton(SingletonKey::Accounts).await?;
    let accounts = doc.as_array().cloned().unwrap_or_default();
    Ok(Json(json!({
        "total_records": accounts.len(),
        "accounts": accounts,
    })))
}

async fn get_lock_settings(Path(_account_id): Path<String>) -> Json<Value> {
    Json(json!({
        "schedule_meeting": {
            "host_video": false,
            "participant_video": false,
            "audio_type": true,
        },
        "in_meeting": {
            "chat": false,
            "screen_sharing": false,
        },
        "email_notification": {
            "cloud_recording_available_reminder": false,
        },
        "recording": {
            "cloud_recording": false,
            "auto_recording": false,
        },
    }))
}
