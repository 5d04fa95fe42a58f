//! End-to-end exercises of the HTTP surface through the assembled
//! router, backed by a throwaway data directory per test.
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use confmock_backend_lib::config::{MissingPolicy, Settings};
use confmock_backend_lib::{router, AppState};

fn app() -> (TempDir, Router) {
    app_with_policy(MissingPolicy::Error)
}

fn app_with_policy(policy: MissingPolicy) -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        on_missing: policy,
        ..Settings::default()
    };
    let state = AppState::from_settings(settings).unwrap();
    (dir, router::create_router(state))
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer test-token");
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
async fn rejects_missing_token_with_vendor_envelope() {
    let (_dir, app) = app();
    let response = send(
        &app,
        Request::builder()
            .uri("/users")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "401");
}

#[tokio::test]
async fn user_create_then_read() {
    let (_dir, app) = app();

    let response = send(
        &app,
        request(
            "POST",
            "/users",
            Some(json!({
                "email": "jane@example.com",
                "first_name": "Jane",
                "last_name": "Doe",
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let user_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["email"], "jane@example.com");

    let response = send(&app, request("GET", &format!("/users/{user_id}"), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = read_json(response).await;
    assert_eq!(fetched["first_name"], "Jane");
}

#[tokio::test]
async fn user_create_requires_email() {
    let (_dir, app) = app();
    let response = send(
        &app,
        request(
            "POST",
            "/users",
            Some(json!({"first_name": "No", "last_name": "Email"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "400");
    assert_eq!(body["error"]["details"], "email is required");
}

async fn create_user(app: &Router) -> String {
    let response = send(
        app,
        request(
            "POST",
            "/users",
            Some(json!({
                "email": "host@example.com",
                "first_name": "Host",
                "last_name": "User",
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn meeting_lifecycle_with_read_after_write() {
    let (_dir, app) = app();
    let user_id = create_user(&app).await;

    let response = send(
        &app,
        request(
            "POST",
            &format!("/users/{user_id}/meetings"),
            Some(json!({"topic": "Kickoff", "start_time": "2026-06-01T10:00:00Z"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let meeting_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["host_id"], user_id.as_str());

    // detail read populates the cache
    let response = send(&app, request("GET", &format!("/meetings/{meeting_id}"), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["topic"], "Kickoff");

    // patch must invalidate it: the next read sees the new topic
    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/users/{user_id}/meetings/{meeting_id}"),
            Some(json!({"topic": "Kickoff v2"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, request("GET", &format!("/meetings/{meeting_id}"), None)).await;
    assert_eq!(read_json(response).await["topic"], "Kickoff v2");

    // listed inside its window, absent outside it
    let response = send(
        &app,
        request(
            "GET",
            &format!("/users/{user_id}/meetings?from=2026-06-01&to=2026-06-30"),
            None,
        ),
    )
    .await;
    let listing = read_json(response).await;
    assert_eq!(listing["total_records"], 1);
    assert_eq!(listing["meetings"][0]["id"], meeting_id.as_str());

    let response = send(
        &app,
        request(
            "GET",
            &format!("/users/{user_id}/meetings?from=2026-07-01&to=2026-07-31"),
            None,
        ),
    )
    .await;
    assert_eq!(read_json(response).await["total_records"], 0);

    // delete, then the detail read is a 404
    let response = send(
        &app,
        request(
            "DELETE",
            &format!("/users/{user_id}/meetings/{meeting_id}"),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("GET", &format!("/meetings/{meeting_id}"), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], "404");
    assert_eq!(
        body["error"]["details"],
        format!("No meeting with id: {meeting_id}")
    );
}

#[tokio::test]
async fn malformed_dates_are_rejected() {
    let (_dir, app) = app();
    let user_id = create_user(&app).await;
    let response = send(
        &app,
        request(
            "GET",
            &format!("/users/{user_id}/meetings?from=06/01/2026"),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_ids_synthesize_under_that_policy() {
    let (_dir, app) = app_with_policy(MissingPolicy::Synthesize);

    let response = send(&app, request("GET", "/meetings/phantom42", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let meeting = read_json(response).await;
    assert_eq!(meeting["id"], "phantom42");

    // repeat reads come back identical thanks to the overlay stash
    let response = send(&app, request("GET", "/meetings/phantom42", None)).await;
    assert_eq!(read_json(response).await["topic"], meeting["topic"]);
}

#[tokio::test]
async fn transcript_download_needs_no_token() {
    let (_dir, app) = app_with_policy(MissingPolicy::Synthesize);
    let response = send(
        &app,
        Request::builder()
            .uri("/rec/download/phantom42/transcript.vtt")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/vtt"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("WEBVTT"));
}

#[tokio::test]
async fn recordings_list_and_delete() {
    let (_dir, app) = app_with_policy(MissingPolicy::Synthesize);

    // synthesized users carry one recorded meeting
    let response = send(
        &app,
        request(
            "GET",
            "/users/rec_user/recordings?from=2026-01-01&to=2026-12-31",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = read_json(response).await;
    let meetings = listing["meetings"].as_array().unwrap();
    assert!(!meetings.is_empty());
    let meeting_id = meetings[0]["id"].as_str().unwrap().to_string();
    let recording_id = meetings[0]["recording_files"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &app,
        request(
            "DELETE",
            &format!("/meetings/{meeting_id}/recordings/{recording_id}"),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request("GET", &format!("/meetings/{meeting_id}/recordings"), None),
    )
    .await;
    assert_eq!(read_json(response).await["recording_count"], 0);
}

#[tokio::test]
async fn tracking_field_crud() {
    let (_dir, app) = app();

    let response = send(
        &app,
        request(
            "POST",
            "/tracking_fields",
            Some(json!({"field": "Cost Center", "value": "CC-42"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let field_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["visible"], true);

    let response = send(&app, request("GET", "/tracking_fields", None)).await;
    assert_eq!(read_json(response).await["total_records"], 1);

    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/tracking_fields/{field_id}"),
            Some(json!({"value": "CC-43", "visible": false})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["value"], "CC-43");
    assert_eq!(updated["visible"], false);

    let response = send(
        &app,
        request("DELETE", &format!("/tracking_fields/{field_id}"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request("GET", &format!("/tracking_fields/{field_id}"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_channel_and_message_flow() {
    let (_dir, app) = app();

    let response = send(
        &app,
        request("POST", "/chat/channels", Some(json!({"name": "general"}))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let channel = read_json(response).await;
    let channel_id = channel["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        request(
            "POST",
            &format!("/chat/channels/{channel_id}/messages"),
            Some(json!({"message": "hello there"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        request("GET", &format!("/chat/channels/{channel_id}/messages"), None),
    )
    .await;
    let listing = read_json(response).await;
    assert_eq!(listing["messages"][0]["message"], "hello there");

    let response = send(
        &app,
        request("DELETE", &format!("/chat/channels/{channel_id}"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request("GET", &format!("/chat/channels/{channel_id}"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_pagination_walks_literal_offset_tokens() {
    let (_dir, app) = app();
    for n in 0..5 {
        let response = send(
            &app,
            request(
                "POST",
                "/tracking_fields",
                Some(json!({"field": format!("Field {n}")})),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // rooms exercise the shared envelope pagination; seed them too
    for n in 0..5 {
        let response = send(
            &app,
            request("POST", "/rooms", Some(json!({"name": format!("Room {n}")}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(&app, request("GET", "/rooms?page_size=2", None)).await;
    let first = read_json(response).await;
    assert_eq!(first["total_records"], 5);
    assert_eq!(first["rooms"].as_array().unwrap().len(), 2);
    assert_eq!(first["next_page_token"], "2");

    let response = send(
        &app,
        request("GET", "/rooms?page_size=2&next_page_token=2", None),
    )
    .await;
    let second = read_json(response).await;
    assert_eq!(second["page_number"], 2);
    assert_eq!(second["next_page_token"], "4");

    let response = send(
        &app,
        request("GET", "/rooms?page_size=2&next_page_token=4", None),
    )
    .await;
    let last = read_json(response).await;
    assert_eq!(last["rooms"].as_array().unwrap().len(), 1);
    assert_eq!(last["next_page_token"], "");
}

#[tokio::test]
async fn cache_admin_clears_entries() {
    let (_dir, app) = app_with_policy(MissingPolicy::Synthesize);

    let response = send(&app, request("GET", "/meetings/cached_m", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, request("POST", "/cache/clear", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request("POST", "/cache/clear/meeting:cached_m", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn webinar_host_scoping() {
    let (_dir, app) = app();
    let host = create_user(&app).await;

    let response = send(
        &app,
        request(
            "POST",
            &format!("/users/{host}/webinars"),
            Some(json!({"topic": "Launch"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let webinar_id = read_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    // reachable account-wide
    let response = send(&app, request("GET", &format!("/webinars/{webinar_id}"), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // scoped to another user it reads as absent
    let response = send(
        &app,
        request(
            "POST",
            "/users",
            Some(json!({
                "email": "other@example.com",
                "first_name": "Other",
                "last_name": "User",
            })),
        ),
    )
    .await;
    let other = read_json(response).await["id"].as_str().unwrap().to_string();
    let response = send(
        &app,
        request("GET", &format!("/users/{other}/webinars/{webinar_id}"), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registrant_writes_invalidate_cached_detail() {
    let (_dir, app) = app();
    let user_id = create_user(&app).await;

    let response = send(
        &app,
        request(
            "POST",
            &format!("/users/{user_id}/meetings"),
            Some(json!({"topic": "Townhall", "start_time": "2026-06-01T10:00:00Z"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let meeting_id = read_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    // prime the cached detail before any registrant exists
    let response = send(&app, request("GET", &format!("/meetings/{meeting_id}"), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(read_json(response).await["registrants"].is_null());

    let response = send(
        &app,
        request(
            "POST",
            &format!("/meetings/{meeting_id}/registrants"),
            Some(json!({
                "registrants": [{"email": "reg@example.com", "first_name": "Reg"}],
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registrant_id = read_json(response).await["registrants"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // the add must evict the cached detail: the next read shows it
    let response = send(&app, request("GET", &format!("/meetings/{meeting_id}"), None)).await;
    let detail = read_json(response).await;
    assert_eq!(detail["registrants"].as_array().unwrap().len(), 1);
    assert_eq!(detail["registrants"][0]["status"], "approved");

    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/meetings/{meeting_id}/registrants/status"),
            Some(json!({"action": "deny", "registrants": [{"id": registrant_id}]})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // same for the status flip
    let response = send(&app, request("GET", &format!("/meetings/{meeting_id}"), None)).await;
    let detail = read_json(response).await;
    assert_eq!(detail["registrants"][0]["status"], "denied");
}

#[tokio::test]
async fn meeting_summary_and_registrants() {
    let (_dir, app) = app_with_policy(MissingPolicy::Synthesize);

    let response = send(
        &app,
        request("GET", "/meetings/sum_m/meeting_summary", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = read_json(response).await;
    assert_eq!(summary["meeting_id"], "sum_m");
    assert!(summary["summary_details"].is_array());

    let response = send(
        &app,
        request(
            "POST",
            "/meetings/sum_m/registrants",
            Some(json!({
                "registrants": [{"email": "reg@example.com", "first_name": "Reg"}],
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, request("GET", "/meetings/sum_m/registrants", None)).await;
    let listing = read_json(response).await;
    assert_eq!(listing["registrants"].as_array().unwrap().len(), 1);
    assert_eq!(listing["registrants"][0]["status"], "approved");
}
