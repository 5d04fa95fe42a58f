// ============================
// confmock-backend-lib/src/handlers/mail.rs
// ============================
//! Mailbox endpoints, Gmail-like wire shapes.
use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::require_str;
use crate::mock;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/emails/mailboxes/{email}/drafts", get(list_drafts))
        .route("/emails/mailboxes/{email}/labels", get(list_labels))
        .route("/emails/mailboxes/{email}/threads", get(list_threads))
        .route("/emails/mailboxes/{email}/messages/send", post(send_message))
}

async fn list_drafts(Path(_email): Path<String>) -> Json<Value> {
    Json(json!({
        "drafts": [{
            "id": "89f1000000000000_e856432f45a75bea_001",
            "message": {
                "id": "89f1000000000000_e856432f45a75bea_001",
                "threadId": "89f1000000000000_e856432f45a88bea_001",
            },
        }],
        "nextPageToken": "e856432f45a75bea",
        "resultSizeEstimate": 1,
    }))
}

async fn list_labels(Path(_email): Path<String>) -> Json<Value> {
    Json(json!({
        "labels": [{
            "id": "Label_1",
            "name": "MyVacation",
            "parentId": "Label_0",
            "labelLevel": 1,
            "messageListVisibility": "show",
            "labelListVisibility": "labelShow",
            "messagesTotal": 100,
            "messagesUnread": 98,
            "threadsTotal": 80,
            "threadsUnread": 78,
            "color": {"textColor": "#000000", "backgroundColor": "#cccccc"},
            "type": "user",
        }],
    }))
}

async fn list_threads(Path(_email): Path<String>) -> Json<Value> {
    Json(json!({
        "threads": [{
            "id": "6ddf401500000000_e858101177b8152c_001",
            "snippet": "Based on previous discussion, we reached preliminary",
            "historyId": "1499070",
            "threadName": "The latest status of Project Prometheus",
            "status": "normal",
        }],
        "nextPageToken": "e8562c0a6ba2b3cd",
        "resultSizeEstimate": 10,
    }))
}

/// Accepts an RFC 2822 payload in `raw` and acknowledges it; nothing
/// is delivered anywhere.
async fn send_message(
    Path(_email): Path<String>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    require_str(&body, "raw")?;
    let message_id = format!("{}_{}_001", mock::random_string(16), mock::random_string(16));
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": message_id,
            "threadId": message_id,
            "labelIds": ["SENT"],
        })),
    ))
}
