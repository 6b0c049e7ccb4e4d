//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // Health
        .route("/api/v1/health", get(http::http_health))
        // Identity
        .route("/api/v1/auth/signup", post(http::http_signup))
        .route("/api/v1/auth/login", post(http::http_login))
        .route("/api/v1/auth/logout", post(http::http_logout))
        .route("/api/v1/auth/me", get(http::http_me))
        // Catalog
        .route(
            "/api/v1/problems",
            get(http::http_list_problems).post(http::http_create_problem),
        )
        .route("/api/v1/problems/:id", get(http::http_get_problem))
        .route("/api/v1/problems/:id/levels", post(http::http_create_level))
        .route("/api/v1/seed", post(http::http_seed))
        // Level gate + submissions
        .route("/api/v1/problems/:id/level", post(http::http_select_level))
        .route("/api/v1/problems/:id/submit", post(http::http_submit))
        .route(
            "/api/v1/problems/:id/submissions",
            get(http::http_list_submissions),
        )
        .route(
            "/api/v1/problems/:id/submissions/count",
            get(http::http_submission_count),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
