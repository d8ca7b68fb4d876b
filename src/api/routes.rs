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
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::readiness))
        // Risk prediction
        .route("/api/predict", post(handlers::predict))
        // Assistant intent routing
        .route("/api/intent", post(handlers::intent))
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
