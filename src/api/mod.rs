//! HTTP front end: upload customers, chat, advance, summarise.

mod cors;
pub mod error;
pub mod sessions;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router, response::IntoResponse};

use crate::conversation::AgentDeps;
use crate::notify::SupervisorNotifier;

pub use cors::build_cors_layer;
pub use error::ApiError;
pub use sessions::SessionRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub deps: AgentDeps,
    pub sessions: SessionRegistry,
    pub notifier: Arc<SupervisorNotifier>,
}

impl AppState {
    pub fn new(deps: AgentDeps, notifier: Arc<SupervisorNotifier>) -> Self {
        Self {
            deps,
            sessions: SessionRegistry::default(),
            notifier,
        }
    }
}

/// Build the Axum router with the session REST routes.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/{id}/start", post(sessions::start_conversation))
        .route("/api/sessions/{id}/messages", post(sessions::post_message))
        .route("/api/sessions/{id}/next", post(sessions::next_customer))
        .route("/api/sessions/{id}/summary", post(sessions::summarize))
        .layer(build_cors_layer())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "retention-agent"
    }))
}
