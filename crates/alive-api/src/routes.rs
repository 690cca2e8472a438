use std::path::PathBuf;

use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, checkin, contacts, notifications};

/// The whole HTTP surface. `static_dir`, when given, serves the web client
/// for any path the API doesn't claim.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/checkin", post(checkin::checkin))
        .route("/api/checkin/stats", get(checkin::stats))
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::add_contact),
        )
        .route(
            "/api/contacts/{id}",
            put(contacts::update_contact).delete(contacts::delete_contact),
        )
        .route("/api/notifications", get(notifications::list_notifications))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
