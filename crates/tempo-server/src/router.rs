//! Axum router construction.
//!
//! Assembles all routes (REST + SSE) into a single [`Router`] with request
//! tracing and CORS enabled for the browser client.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::stream;

/// Build the complete Axum router.
///
/// CORS allows any origin so the web client can be served separately
/// during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Onboarding & profile
        .route("/api/onboarding", post(handlers::onboarding))
        .route(
            "/api/profile",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
        // Schedule
        .route("/api/schedule", get(handlers::get_schedule))
        .route("/api/schedule/events", post(handlers::add_event))
        .route(
            "/api/schedule/events/{date}/{id}",
            delete(handlers::remove_event),
        )
        .route("/api/schedule/generate", post(handlers::generate_schedule))
        .route("/api/schedule/command", post(handlers::schedule_command))
        .route("/api/schedule/stream", get(stream::schedule_stream))
        // Voice avatar
        .route("/api/avatar/tools", get(handlers::avatar_tools))
        .route("/api/avatar/conversations", post(handlers::create_conversation))
        .route("/api/avatar/tool-call", post(handlers::tool_call))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
