// ============================
// confmock-backend-lib/src/handlers/qss.rs
// ============================
//! Quality-of-service score endpoints plus per-participant QoS
//! summaries for meetings, webinars and Video SDK sessions. Feedback
//! is the only stateful piece; everything else is sampled on read.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::{require_str, ListQuery};
use crate::mock;
use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/qss/score/{meeting_id}", get(get_score))
        .route("/qss/feedback", post(submit_feedback))
        .route("/qss/feedback/{feedback_id}", get(get_feedback).delete(delete_feedback))
        .route(
            "/metrics/meetings/{meeting_id}/participants/qos_summary",
            get(meeting_qos_summary),
        )
        .route(
            "/metrics/webinars/{webinar_id}/participants/qos_summary",
            get(webinar_qos_summary),
        )
        .route(
            "/videosdk/sessions/{session_id}/users/qos_summary",
            get(videosdk_qos_summary),
        )
}

fn rounded(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

async fn get_score(Path(meeting_id): Path<String>) -> Json<Value> {
    let mut rng = rand::thread_rng();
    Json(json!({
        "meeting_id": meeting_id,
        "quality_score": rounded(rng.gen_range(3.0..=5.0)),
        "score_breakdown": {
            "video": rounded(rng.gen_range(3.5..=5.0)),
            "audio": rounded(rng.gen_range(3.5..=5.0)),
            "screen_share": rounded(rng.gen_range(3.5..=5.0)),
        },
    }))
}

async fn submit_feedback(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(json!({})));
    let meeting_id = require_str(&body, "meeting_id")?;

    let feedback_id = mock::random_id();
    let record = json!({
        "id": feedback_id,
        "meeting_id": meeting_id,
        "rating": body.get("rating").cloned().unwrap_or(Value::Null),
        "comments": body.get("comments").and_then(Value::as_str).unwrap_or(""),
        "created_at": mock::now_ts(),
    });
    state.feedback.insert(feedback_id, record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_feedback(
    State(state): State<SharedState>,
    Path(feedback_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .feedback
        .get(&feedback_id)
        .map(|entry| Json(entry.value().clone()))
        .ok_or_else(|| ApiError::not_found("Feedback", &feedback_id))
}

async fn delete_feedback(
    State(state): State<SharedState>,
    Path(feedback_id): Path<String>,
) -> StatusCode {
    state.feedback.remove(&feedback_id);
    StatusCode::NO_CONTENT
}

fn clamp_page_size(query: &ListQuery) -> usize {
    query.page_size.unwrap_or(30).clamp(1, 300) as usize
}

fn qos_participant() -> Value {
    let mut rng = rand::thread_rng();
    json!({
        "id": mock::random_id(),
        "participant_id": format!("{}", rng.gen_range(10_000_000u64..100_000_000)),
        "user_name": format!("User_{}", mock::random_string(8)),
        "email": format!("{}@zoom-mock.com", mock::random_string(8).to_lowercase()),
        "qos": mock::qos_data(),
    })
}

fn qos_summary_page(query: &ListQuery, key: &str, entry: fn() -> Value) -> Value {
    let page_size = clamp_page_size(query);
    let offset: usize = query.next_page_token.parse().unwrap_or(0);
    let count = rand::thread_rng().gen_range(1..=page_size);
    let entries: Vec<Value> = (0..count).map(|_| entry()).collect();
    // same literal-offset tokens as the stored listings
    let next_page_token = if count == page_size {
        (offset + page_size).to_string()
    } else {
        String::new()
    };
    json!({
        "page_size": page_size,
        "next_page_token": next_page_token,
        key: entries,
    })
}

async fn meeting_qos_summary(
    Path(meeting_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let mut out = qos_summary_page(&query, "participants", qos_participant);
    out["meeting_id"] = json!(meeting_id);
    Json(out)
}

async fn webinar_qos_summary(
    Path(webinar_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let mut out = qos_summary_page(&query, "participants", qos_participant);
    out["webinar_id"] = json!(webinar_id);
    Json(out)
}

fn videosdk_user() -> Value {
    let mut rng = rand::thread_rng();
    json!({
        "id": mock::random_id(),
        "name": format!("User_{}", mock::random_string(8)),
        "user_key": mock::random_string(rng.gen_range(10..36)),
        "qos": mock::qos_data(),
    })
}

async fn videosdk_qos_summary(
    Path(session_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let mut out = qos_summary_page(&query, "users", videosdk_user);
    out["session_id"] = json!(session_id);
    Json(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_clamped_to_documented_bounds() {
        let mut query = ListQuery::default();
        assert_eq!(clamp_page_size(&query), 30);
        query.page_size = Some(0);
        assert_eq!(clamp_page_size(&query), 1);
        query.page_size = Some(5000);
        assert_eq!(clamp_page_size(&query), 300);
    }

    #[test]
    fn qos_summary_tokens_are_literal_offsets() {
        // page_size 1 forces a full page, so a token must be emitted
        let mut query = ListQuery {
            page_size: Some(1),
            ..ListQuery::default()
        };
        let page = qos_summary_page(&query, "participants", qos_participant);
        assert_eq!(page["next_page_token"], "1");

        query.next_page_token = "7".to_string();
        let page = qos_summary_page(&query, "participants", qos_participant);
        assert_eq!(page["next_page_token"], "8");
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert_eq!(rounded(4.4449), 4.4);
        assert_eq!(rounded(3.96), 4.0);
    }
}
