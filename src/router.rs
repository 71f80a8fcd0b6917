use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        // Auth routes
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/verify-token", get(handlers::auth::verify_token))
        // Habit routes
        .route("/habits", get(handlers::habits::list_habits))
        .route("/habits", post(handlers::habits::create_habit))
        .route("/habits/:id", put(handlers::habits::update_habit))
        .route("/habits/:id", delete(handlers::habits::delete_habit))
        .route("/habits/:id/toggle", post(handlers::habits::toggle_habit))
        // Event routes
        .route("/events", get(handlers::events::list_events))
        .route("/events", post(handlers::events::create_event))
        .route("/events/:id", put(handlers::events::update_event))
        .route("/events/:id", delete(handlers::events::delete_event))
        // Health
        .route("/health", get(handlers::healthcheck))
        // Add state and middleware
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
