// ============================
// confmock-backend-lib/src/handlers/cache_admin.rs
// ============================
//! Cache administration: drop cached responses without restarting.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};

use crate::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cache/clear", post(clear_all))
        .route("/cache/clear/{key}", post(clear_key))
}

async fn clear_all(State(state): State<SharedState>) -> StatusCode {
    state.cache.clear();
    StatusCode::NO_CONTENT
}

async fn clear_key(State(state): State<SharedState>, Path(key): Path<String>) -> StatusCode {
    state.cache.invalidate(&key);
    StatusCode::NO_CONTENT
}
