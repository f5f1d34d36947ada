use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))
        // Legacy prediction surface (always-200, error-in-body)
        .route("/predict", post(handlers::predict))
        .route("/explain", post(handlers::explain))
        .route("/metrics", post(handlers::metrics))
        .route("/coefficients", get(handlers::coefficients))
        // Call-queue simulator (typed errors, non-2xx on failure)
        .route("/v1/queue", get(handlers::queue_view))
        .route("/v1/queue/reset", post(handlers::queue_reset))
        .route("/v1/queue/submit", post(handlers::queue_submit))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
}
