// ============================
// confmock-backend-lib/src/router.rs
// ============================
//! Assembles the full application router: every resource family
//! behind the bearer check, plus the unauthenticated transcript
//! download.
use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::handlers;
use crate::SharedState;

pub fn create_router(state: SharedState) -> Router {
    let protected = Router::new()
        .merge(handlers::accounts::routes())
        .merge(handlers::cache_admin::routes())
        .merge(handlers::calendar::routes())
        .merge(handlers::chat::routes())
        .merge(handlers::dashboards::routes())
        .merge(handlers::devices::routes())
        .merge(handlers::groups::routes())
        .merge(handlers::mail::routes())
        .merge(handlers::meetings::routes())
        .merge(handlers::phone::routes())
        .merge(handlers::qss::routes())
        .merge(handlers::recordings::routes())
        .merge(handlers::reports::routes())
        .merge(handlers::roles::routes())
        .merge(handlers::rooms::routes())
        .merge(handlers::tracking_fields::routes())
        .merge(handlers::users::routes())
        .merge(handlers::webinars::routes())
        .layer(middleware::from_fn(auth::require_bearer));

    Router::new()
        .merge(protected)
        .route(
            "/rec/download/{meeting_id}/{*rest}",
            get(handlers::recordings::download_transcript),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
