//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod auth;
mod governance;
mod records;

use crate::auth::auth_middleware;
use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Routes that act on behalf of a caller
    let authenticated = Router::new()
        .route("/api/editor", put(governance::update_editor))
        .route("/api/proposals", post(governance::register_proposal))
        .route("/api/proposals/{id}/status", post(governance::change_status))
        .route("/api/proposals/{id}/transitions", get(governance::allowed_transitions))
        .route("/api/proposals/{id}/document", put(records::put_document))
        .route("/api/proposals/{id}/comments", post(records::add_comment))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Auth routes
        .route("/api/auth/token", post(auth::issue_token))
        .route("/api/auth/refresh", post(auth::refresh))

        // Registry queries
        .route("/api/editor", get(governance::get_editor))
        .route("/api/proposals", get(governance::list_proposals))
        .route("/api/proposals/{id}", get(governance::get_proposal))
        .route("/api/proposals/{id}/authors", get(governance::get_authors))
        .route("/api/proposals/{id}/authors/{address}", get(governance::is_author))
        .route("/api/events", get(governance::list_events))

        // Record store
        .route("/api/proposals/{id}/document", get(records::get_document))
        .route("/api/proposals/{id}/comments", get(records::list_comments))
        .route("/api/proposals/{id}/comments/{comment_id}", get(records::get_comment))

        .merge(authenticated)

        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
